//! Component types and their solvers.
//!
//! This module provides the behaviors a component can have:
//! - Wire: variable arity, copies a change on one pin to all the others
//! - Adder: two inputs summed onto an output and a carry pin
//! - None: structural placeholder that never reacts
//!
//! A [`ComponentType`] binds a solver to a name, a declared pin count and a
//! sensitivity mask. Solvers are looked up by name through an explicit
//! [`SolverRegistry`] and dispatched through the [`SolverKind`] enum, so the
//! propagation loop never does a string lookup.

mod adder;
mod wire;

pub use adder::{ADDER_PINS, SETTLE_DELAY};
pub use wire::WIRE_DELAY;

use std::collections::HashMap;
use std::sync::Arc;

use crate::circuit::{ComponentId, Event, EventQueue, PinId, Signal, Time};
use crate::error::{Result, TapError};

/// Signature of a solver function.
///
/// A solver reads one input snapshot per component pin, in declared order,
/// and schedules zero or more events on `queue`. Emitted events should be
/// stamped strictly after `now` and carry `component` as their source.
pub type SolverFn = fn(inputs: &[Event], queue: &mut EventQueue, now: Time, component: ComponentId);

/// The behavior of a component type.
#[derive(Debug, Clone, Copy)]
pub enum SolverKind {
    Wire,
    Adder,
    /// Never emits anything
    None,
    /// A solver function registered by the host
    Custom(SolverFn),
}

impl SolverKind {
    /// Run the solver for one component.
    pub fn solve(&self, inputs: &[Event], queue: &mut EventQueue, now: Time, component: ComponentId) {
        match self {
            SolverKind::Wire => wire::solve(inputs, queue, now, component),
            SolverKind::Adder => adder::solve(inputs, queue, now, component),
            SolverKind::None => {}
            SolverKind::Custom(solver) => solver(inputs, queue, now, component),
        }
    }
}

/// Name-keyed table of solvers.
///
/// Owned by whoever builds component types; there is no process-wide table.
#[derive(Debug, Clone, Default)]
pub struct SolverRegistry {
    solvers: HashMap<String, SolverKind>,
}

impl SolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in solvers: `wire`, `adder`, `none`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("wire", SolverKind::Wire);
        registry.register("adder", SolverKind::Adder);
        registry.register("none", SolverKind::None);
        tracing::info!(count = registry.len(), "registered solver functions");
        registry
    }

    /// Register a solver under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, solver: SolverKind) {
        self.solvers.insert(name.into(), solver);
    }

    /// Look up a solver by name.
    pub fn resolve(&self, name: &str) -> Result<SolverKind> {
        self.solvers
            .get(name)
            .copied()
            .ok_or_else(|| TapError::unknown_solver(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.solvers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.solvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvers.is_empty()
    }

    /// Remove every solver.
    pub fn clear(&mut self) {
        self.solvers.clear();
    }
}

/// A named, reusable component behavior.
#[derive(Debug, Clone)]
pub struct ComponentType {
    /// Identifying name; instances are matched back to types by this name
    pub name: String,
    /// Pin indices whose events trigger the solver (empty = all pins)
    pub sensitivity: Vec<usize>,
    /// Declared pin count (0 = variable arity)
    pub pin_count: usize,
    /// Name the solver was resolved from
    pub solver_name: String,
    pub solver: SolverKind,
}

impl ComponentType {
    /// Create a type with all pins sensitive and variable arity.
    pub fn new(name: impl Into<String>, solver_name: impl Into<String>, solver: SolverKind) -> Self {
        Self {
            name: name.into(),
            sensitivity: Vec::new(),
            pin_count: 0,
            solver_name: solver_name.into(),
            solver,
        }
    }

    /// Create a type whose solver is looked up by name in `registry`.
    pub fn from_registry(
        name: impl Into<String>,
        solver_name: &str,
        registry: &SolverRegistry,
    ) -> Result<Self> {
        let solver = registry.resolve(solver_name)?;
        Ok(Self::new(name, solver_name, solver))
    }

    /// The default wire type.
    pub fn wire() -> Self {
        Self::new("Wire", "wire", SolverKind::Wire)
    }

    /// A four-pin adder sensitive to its two inputs.
    pub fn adder() -> Self {
        Self::new("Adder", "adder", SolverKind::Adder)
            .with_pin_count(ADDER_PINS)
            .with_sensitivity(vec![0, 1])
    }

    /// A structural type that never reacts.
    pub fn none(name: impl Into<String>, pin_count: usize) -> Self {
        Self::new(name, "none", SolverKind::None).with_pin_count(pin_count)
    }

    /// Set the declared pin count (0 = variable arity).
    pub fn with_pin_count(mut self, pin_count: usize) -> Self {
        self.pin_count = pin_count;
        self
    }

    /// Set the sensitivity mask (empty = all pins).
    pub fn with_sensitivity(mut self, sensitivity: Vec<usize>) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Replace the solver with the one registered under `solver_name`.
    pub fn set_solver(&mut self, solver_name: &str, registry: &SolverRegistry) -> Result<()> {
        self.solver = registry.resolve(solver_name)?;
        self.solver_name = solver_name.to_string();
        Ok(())
    }

    /// Check if the type accepts any number of pins.
    pub fn is_variable_arity(&self) -> bool {
        self.pin_count == 0
    }

    /// Check that the sensitivity mask fits the declared pin count.
    pub fn validate(&self) -> Result<()> {
        if self.is_variable_arity() {
            return Ok(());
        }
        match self.sensitivity.iter().find(|&&index| index >= self.pin_count) {
            Some(&index) => Err(TapError::InvalidSensitivity {
                type_name: self.name.clone(),
                index,
            }),
            None => Ok(()),
        }
    }
}

impl Default for ComponentType {
    fn default() -> Self {
        Self::wire()
    }
}

/// A component instance wired into the patch bay.
#[derive(Debug, Clone)]
pub struct Component {
    pub component_type: Arc<ComponentType>,
    /// Connected pins, in the order the solver expects them
    pub pins: Vec<PinId>,
    /// Internal memory, reserved for stateful solvers
    pub memory: Vec<Signal>,
}

impl Component {
    pub fn new(component_type: Arc<ComponentType>, pins: Vec<PinId>) -> Self {
        Self {
            component_type,
            pins,
            memory: Vec::new(),
        }
    }

    /// The pins whose events trigger this component's solver.
    ///
    /// Mask entries past the end of the pin list are skipped.
    pub fn sensitive_pins(&self) -> Vec<PinId> {
        let mask = &self.component_type.sensitivity;
        if mask.is_empty() {
            return self.pins.clone();
        }
        mask.iter().filter_map(|&i| self.pins.get(i).copied()).collect()
    }

    pub fn type_name(&self) -> &str {
        &self.component_type.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins(ids: &[usize]) -> Vec<PinId> {
        ids.iter().map(|&i| PinId(i)).collect()
    }

    #[test]
    fn test_registry_builtins() {
        let registry = SolverRegistry::with_builtins();
        assert_eq!(registry.len(), 3);
        assert!(matches!(registry.resolve("adder"), Ok(SolverKind::Adder)));
        assert!(matches!(
            registry.resolve("flipflop"),
            Err(TapError::UnknownSolver { .. })
        ));
    }

    #[test]
    fn test_registry_custom_solver() {
        fn echo(inputs: &[Event], queue: &mut EventQueue, now: Time, component: ComponentId) {
            for input in inputs {
                queue.insert(Event::from_component(now + 2, input.state, input.pin, component));
            }
        }

        let mut registry = SolverRegistry::new();
        registry.register("echo", SolverKind::Custom(echo));
        let ty = ComponentType::from_registry("Echo", "echo", &registry).unwrap();

        let mut queue = EventQueue::new();
        ty.solver.solve(&[Event::new(1, Signal::HIGH, PinId(4))], &mut queue, 1, ComponentId(0));
        assert_eq!(queue.pop_minimum().map(|e| e.time), Some(3));
    }

    #[test]
    fn test_set_solver_rejects_unknown_name() {
        let registry = SolverRegistry::with_builtins();
        let mut ty = ComponentType::wire();
        assert!(ty.set_solver("missing", &registry).is_err());
        assert_eq!(ty.solver_name, "wire");
        ty.set_solver("none", &registry).unwrap();
        assert_eq!(ty.solver_name, "none");
    }

    #[test]
    fn test_sensitive_pins_all_when_mask_empty() {
        let wire = Component::new(Arc::new(ComponentType::wire()), pins(&[4, 7, 9]));
        assert_eq!(wire.sensitive_pins(), pins(&[4, 7, 9]));
    }

    #[test]
    fn test_sensitive_pins_follow_mask() {
        let adder = Component::new(Arc::new(ComponentType::adder()), pins(&[0, 1, 2, 3]));
        assert_eq!(adder.sensitive_pins(), pins(&[0, 1]));
    }

    #[test]
    fn test_validate_sensitivity() {
        assert!(ComponentType::adder().validate().is_ok());
        let bad = ComponentType::none("Meter", 2).with_sensitivity(vec![0, 2]);
        assert!(matches!(
            bad.validate(),
            Err(TapError::InvalidSensitivity { index: 2, .. })
        ));
    }
}

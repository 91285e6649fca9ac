//! The shared circuit: event propagation behind a reentrant lock.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::circuit::{ComponentId, Event, Network, PatchBay, PinId, Signal, Time};
use crate::components::ComponentType;
use crate::error::{Result, TapError};
use crate::DEFAULT_TICK_RATE;

/// Configuration for a circuit.
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Simulated ticks per audio sample.
    pub tick_rate: Time,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

impl CircuitConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of simulated ticks per audio sample.
    ///
    /// Component delays are counted in ticks, so a higher tick rate leaves
    /// more room for gate delays within one sample.
    pub fn with_tick_rate(mut self, tick_rate: Time) -> Self {
        self.tick_rate = tick_rate;
        self
    }
}

/// The network and patch bay created by [`Circuit::instantiate`].
#[derive(Debug, Clone, Default)]
struct CircuitCore {
    network: Network,
    patch_bay: PatchBay,
}

impl CircuitCore {
    /// Pop one event, apply it to its pin, and re-solve the components
    /// sensitive to that pin.
    ///
    /// Returns `false` only if the queue was empty. An event on a missing
    /// pin or component is logged and dropped; the queue keeps draining.
    fn process_once(&mut self) -> bool {
        let CircuitCore { network, patch_bay } = self;

        let Some(event) = patch_bay.queue_mut().pop_minimum() else {
            return false;
        };

        let attached: Vec<ComponentId> = match patch_bay.pin(event.pin) {
            Some(pin) => pin.components.iter().copied().collect(),
            None => {
                tracing::error!(pin = %event.pin, time = event.time, "propagated event on bad pin id");
                return true;
            }
        };

        // the only place a pin's state changes during simulation
        match patch_bay.pin_event_mut(event.pin) {
            Some(state) => *state = event,
            None => {
                tracing::error!(pin = %event.pin, "state missing for pin");
                return true;
            }
        }

        for id in attached {
            if event.source == Some(id) {
                continue;
            }

            let Some(component) = network.get_component(id) else {
                tracing::error!(component = %id, pin = %event.pin, "propagated event on bad component id");
                continue;
            };

            let inputs: Option<Vec<Event>> = component
                .pins
                .iter()
                .map(|&pin| patch_bay.pin_event(pin).copied())
                .collect();
            let Some(inputs) = inputs else {
                tracing::error!(component = %id, "component references a missing pin");
                continue;
            };

            tracing::trace!(component = %id, pin = %event.pin, time = event.time, "solving component");
            component
                .component_type
                .solver
                .solve(&inputs, patch_bay.queue_mut(), event.time, id);
        }

        true
    }
}

#[derive(Debug)]
struct CircuitState {
    core: RefCell<Option<CircuitCore>>,
    tick_rate: Cell<Time>,
    /// High-water mark of pushed event times; `None` until the first push
    latest_event_time: Cell<Option<Time>>,
}

/// A simulated circuit shared between a real-time driver and an editor.
///
/// Every operation takes the circuit's reentrant lock for its duration. A
/// caller that wants several operations to happen atomically holds a
/// [`CircuitGuard`] from [`Circuit::lock`] (or [`Circuit::try_lock`] on a
/// real-time thread) and keeps calling methods through it; the same thread
/// may re-enter the lock freely.
///
/// Queries share the network and patch bay, so they can be nested inside
/// [`Circuit::with_network`] or [`Circuit::with_patch_bay`]. An edit made
/// from inside one of those views is refused with [`TapError::StateInUse`].
///
/// A circuit starts empty. [`Circuit::instantiate`] creates its network and
/// patch bay; until then graph edits fail with [`TapError::NotInstantiated`]
/// and queries return nothing.
#[derive(Debug)]
pub struct Circuit {
    state: ReentrantMutex<CircuitState>,
}

impl Circuit {
    /// Create an uninstantiated circuit with default configuration.
    pub fn new() -> Self {
        Self::with_config(CircuitConfig::default())
    }

    /// Create an uninstantiated circuit with custom configuration.
    pub fn with_config(config: CircuitConfig) -> Self {
        Self {
            state: ReentrantMutex::new(CircuitState {
                core: RefCell::new(None),
                tick_rate: Cell::new(config.tick_rate),
                latest_event_time: Cell::new(None),
            }),
        }
    }

    /// Create a circuit and instantiate it, ready to be shared.
    pub fn instantiated(config: CircuitConfig) -> Arc<Self> {
        let circuit = Self::with_config(config);
        circuit.instantiate();
        Arc::new(circuit)
    }

    fn read_core<R>(&self, f: impl FnOnce(&CircuitCore) -> R) -> Result<R> {
        let state = self.state.lock();
        let core = state.core.try_borrow().map_err(|_| {
            tracing::error!("circuit read while it is being modified");
            TapError::StateInUse
        })?;
        core.as_ref().map(f).ok_or(TapError::NotInstantiated)
    }

    fn write_core<R>(&self, f: impl FnOnce(&mut CircuitCore) -> R) -> Result<R> {
        let state = self.state.lock();
        let mut core = state.core.try_borrow_mut().map_err(|_| {
            tracing::error!("circuit modified from inside a read-only view");
            TapError::StateInUse
        })?;
        core.as_mut().map(f).ok_or(TapError::NotInstantiated)
    }

    // ============ Locking ============

    /// Block until the lock is available and hold it.
    pub fn lock(&self) -> CircuitGuard<'_> {
        CircuitGuard {
            circuit: self,
            _guard: self.state.lock(),
        }
    }

    /// Take the lock only if no other thread holds it.
    pub fn try_lock(&self) -> Option<CircuitGuard<'_>> {
        self.state.try_lock().map(|guard| CircuitGuard {
            circuit: self,
            _guard: guard,
        })
    }

    // ============ Lifecycle ============

    /// Replace the network and patch bay with fresh, empty ones.
    ///
    /// Configuration and the latest event time are kept.
    pub fn instantiate(&self) {
        let state = self.state.lock();
        match state.core.try_borrow_mut() {
            Ok(mut core) => {
                *core = Some(CircuitCore::default());
                tracing::debug!("instantiated circuit");
            }
            Err(_) => tracing::error!("cannot instantiate a circuit from inside a read-only view"),
        };
    }

    pub fn is_instantiated(&self) -> bool {
        self.read_core(|_| ()).is_ok()
    }

    /// Remove every pin, component and pending event.
    ///
    /// Registered component types, the tick rate and the latest event time
    /// are kept.
    pub fn clear(&self) {
        let cleared = self.write_core(|core| {
            core.patch_bay.clear();
            core.network.clear_components();
        });
        if let Err(TapError::NotInstantiated) = cleared {
            tracing::warn!("cleared a circuit that was never instantiated");
        }
    }

    pub fn tick_rate(&self) -> Time {
        self.state.lock().tick_rate.get()
    }

    pub fn set_tick_rate(&self, tick_rate: Time) {
        self.state.lock().tick_rate.set(tick_rate);
    }

    // ============ Simulation ============

    /// Queue an externally sourced event.
    pub fn push_event(&self, time: Time, state: Signal, pin: PinId) -> Result<()> {
        let guard = self.state.lock();
        self.write_core(|core| core.patch_bay.push_event(time, state, pin))?;
        let latest = guard.latest_event_time.get().map_or(time, |t| t.max(time));
        guard.latest_event_time.set(Some(latest));
        Ok(())
    }

    /// Highest event time ever pushed, or 0 before the first push. Never
    /// decreases.
    pub fn latest_event_time(&self) -> Time {
        self.state.lock().latest_event_time.get().unwrap_or(0)
    }

    /// The first time a new stream of input may use without landing on an
    /// already pushed tick: one tick past the latest event time, or 0 if
    /// nothing was ever pushed.
    pub fn resume_time(&self) -> Time {
        let state = self.state.lock();
        state
            .latest_event_time
            .get()
            .map_or(0, |latest| latest + state.tick_rate.get())
    }

    /// Number of pending events.
    pub fn event_count(&self) -> usize {
        self.read_core(|core| core.patch_bay.event_count()).unwrap_or(0)
    }

    /// Time of the earliest pending event.
    pub fn next_event_time(&self) -> Option<Time> {
        self.read_core(|core| core.patch_bay.next_event().map(|e| e.time))
            .ok()
            .flatten()
    }

    /// Apply the earliest pending event.
    ///
    /// Returns `Ok(false)` if there was nothing to process.
    pub fn process_once(&self) -> Result<bool> {
        let processed = self.write_core(CircuitCore::process_once)?;
        if !processed {
            tracing::warn!("tried to process an empty queue");
        }
        Ok(processed)
    }

    /// Apply every pending event stamped at or before `end_time`, including
    /// events emitted along the way. Returns the number of events applied.
    pub fn process_to(&self, end_time: Time) -> Result<usize> {
        self.write_core(|core| {
            let mut count = 0;
            while core
                .patch_bay
                .queue()
                .minimum_time()
                .is_some_and(|time| time <= end_time)
            {
                core.process_once();
                count += 1;
            }
            count
        })
    }

    // ============ Pins ============

    pub fn add_pin(&self, initial_state: Signal) -> Result<PinId> {
        self.write_core(|core| core.patch_bay.add_pin(initial_state))
    }

    /// Remove a pin, freeing its label.
    ///
    /// Refused (returns `false`) while any component is wired to the pin,
    /// including pins a component only writes to. Remove or move those
    /// components first.
    pub fn remove_pin(&self, pin: PinId) -> bool {
        self.write_core(|core| {
            let wired = core.network.components_on_pin(pin);
            if !wired.is_empty() {
                tracing::warn!(pin = %pin, components = ?wired, "refused to remove a wired pin");
                return false;
            }
            core.patch_bay.remove_pin(pin)
        })
        .unwrap_or(false)
    }

    pub fn has_pin(&self, pin: PinId) -> bool {
        self.read_core(|core| core.patch_bay.has_pin(pin))
            .unwrap_or(false)
    }

    /// Ids of all live pins.
    pub fn pin_ids(&self) -> Vec<PinId> {
        self.read_core(|core| core.patch_bay.pin_ids().collect())
            .unwrap_or_default()
    }

    /// The signal last applied to a pin. Logs an error if it is missing.
    pub fn get_pin_state(&self, pin: PinId) -> Option<Signal> {
        self.read_core(|core| core.patch_bay.get_pin_state(pin))
            .ok()
            .flatten()
    }

    /// The event last applied to a pin, with its time.
    pub fn get_pin_event(&self, pin: PinId) -> Option<Event> {
        self.read_core(|core| core.patch_bay.pin_event(pin).copied())
            .ok()
            .flatten()
    }

    /// The applied signal of every live pin.
    pub fn all_pin_states(&self) -> BTreeMap<PinId, Signal> {
        self.read_core(|core| core.patch_bay.all_pin_states())
            .unwrap_or_default()
    }

    /// Overwrite a pin's applied signal without going through the queue.
    pub fn set_pin_state(&self, pin: PinId, state: Signal) -> bool {
        self.write_core(|core| core.patch_bay.set_pin_state(pin, state))
            .unwrap_or(false)
    }

    pub fn get_pin_connections(&self, pin: PinId) -> Vec<ComponentId> {
        self.read_core(|core| core.patch_bay.get_pin_connections(pin))
            .unwrap_or_default()
    }

    pub fn get_all_pin_connections(&self) -> BTreeMap<PinId, Vec<ComponentId>> {
        self.read_core(|core| core.patch_bay.get_all_pin_connections())
            .unwrap_or_default()
    }

    // ============ Components ============

    /// Register a component type, returning its type index.
    pub fn add_component_type(&self, component_type: ComponentType) -> Result<usize> {
        self.write_core(|core| core.network.add_component_type(component_type))?
    }

    /// Replace the registered component types.
    pub fn set_component_types(&self, component_types: Vec<ComponentType>) -> Result<()> {
        self.write_core(|core| core.network.set_component_types(component_types))?
    }

    /// Wire a new component of type `type_index` onto `pins`.
    ///
    /// See [`Network::add_component`].
    pub fn add_component(&self, pins: &[PinId], type_index: usize) -> Result<ComponentId> {
        self.write_core(|core| core.network.add_component(&mut core.patch_bay, pins, type_index))?
    }

    /// Rewire a component onto `new_pins`. See [`Network::move_component`].
    pub fn move_component(&self, component: ComponentId, new_pins: &[PinId]) -> Result<()> {
        self.write_core(|core| {
            core.network
                .move_component(&mut core.patch_bay, component, new_pins)
        })?
    }

    pub fn remove_component(&self, component: ComponentId) -> bool {
        self.write_core(|core| core.network.remove_component(&mut core.patch_bay, component))
            .unwrap_or(false)
    }

    pub fn get_component_type(&self, component: ComponentId) -> Option<Arc<ComponentType>> {
        self.read_core(|core| core.network.get_component_type(component))
            .ok()
            .flatten()
    }

    pub fn get_component_connections(&self, component: ComponentId) -> Vec<PinId> {
        self.read_core(|core| core.network.get_component_connections(component))
            .unwrap_or_default()
    }

    pub fn get_all_component_connections(&self) -> Vec<(ComponentId, Vec<PinId>)> {
        self.read_core(|core| core.network.get_all_component_connections())
            .unwrap_or_default()
    }

    pub fn get_all_component_types(&self) -> Vec<(ComponentId, Option<usize>)> {
        self.read_core(|core| core.network.get_all_component_types())
            .unwrap_or_default()
    }

    /// Read-only access to the network. Other queries may be nested inside.
    pub fn with_network<R>(&self, f: impl FnOnce(&Network) -> R) -> Option<R> {
        self.read_core(|core| f(&core.network)).ok()
    }

    /// Read-only access to the patch bay. Other queries may be nested inside.
    pub fn with_patch_bay<R>(&self, f: impl FnOnce(&PatchBay) -> R) -> Option<R> {
        self.read_core(|core| f(&core.patch_bay)).ok()
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds a circuit's lock until dropped.
///
/// Dereferences to the [`Circuit`], so every circuit method can be called
/// through the guard without releasing the lock in between.
pub struct CircuitGuard<'a> {
    circuit: &'a Circuit,
    _guard: ReentrantMutexGuard<'a, CircuitState>,
}

impl CircuitGuard<'_> {
    /// Release the lock.
    pub fn unlock(self) {}
}

impl Deref for CircuitGuard<'_> {
    type Target = Circuit;

    fn deref(&self) -> &Circuit {
        self.circuit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::WIRE_TYPE;

    fn circuit() -> Arc<Circuit> {
        Circuit::instantiated(CircuitConfig::new().with_tick_rate(4))
    }

    #[test]
    fn test_uninstantiated_circuit() {
        let circuit = Circuit::new();
        assert!(!circuit.is_instantiated());
        assert!(matches!(circuit.add_pin(Signal::LOW), Err(TapError::NotInstantiated)));
        assert!(matches!(
            circuit.push_event(1, Signal::HIGH, PinId(0)),
            Err(TapError::NotInstantiated)
        ));
        assert!(circuit.process_to(10).is_err());
        assert_eq!(circuit.event_count(), 0);
        assert!(!circuit.has_pin(PinId(0)));
    }

    #[test]
    fn test_single_event_applies_state() {
        let circuit = circuit();
        let pin = circuit.add_pin(Signal::LOW).unwrap();
        circuit.push_event(7, Signal::HIGH, pin).unwrap();

        assert_eq!(circuit.process_to(6).unwrap(), 0);
        assert_eq!(circuit.get_pin_state(pin), Some(Signal::LOW));
        assert_eq!(circuit.process_to(7).unwrap(), 1);
        let applied = circuit.get_pin_event(pin).unwrap();
        assert_eq!((applied.time, applied.state), (7, Signal::HIGH));
    }

    #[test]
    fn test_process_once_on_empty_queue() {
        let circuit = circuit();
        assert!(!circuit.process_once().unwrap());
    }

    #[test]
    fn test_event_on_removed_pin_is_skipped() {
        let circuit = circuit();
        let a = circuit.add_pin(Signal::LOW).unwrap();
        let b = circuit.add_pin(Signal::LOW).unwrap();
        circuit.push_event(1, Signal::HIGH, a).unwrap();
        circuit.push_event(2, Signal::HIGH, b).unwrap();
        assert!(circuit.remove_pin(a));

        assert_eq!(circuit.process_to(5).unwrap(), 2);
        assert_eq!(circuit.get_pin_state(b), Some(Signal::HIGH));
        assert_eq!(circuit.event_count(), 0);
    }

    #[test]
    fn test_wire_does_not_bounce_back() {
        let circuit = circuit();
        let a = circuit.add_pin(Signal::LOW).unwrap();
        let b = circuit.add_pin(Signal::LOW).unwrap();
        circuit.add_component(&[a, b], WIRE_TYPE).unwrap();

        circuit.push_event(5, Signal::HIGH, a).unwrap();
        assert_eq!(circuit.process_to(100).unwrap(), 2);
        assert_eq!(circuit.event_count(), 0);
        assert_eq!(circuit.get_pin_event(b).map(|e| e.time), Some(6));
    }

    #[test]
    fn test_latest_event_time_is_high_water_mark() {
        let circuit = circuit();
        let pin = circuit.add_pin(Signal::LOW).unwrap();
        circuit.push_event(10, Signal::HIGH, pin).unwrap();
        circuit.push_event(4, Signal::HIGH, pin).unwrap();
        assert_eq!(circuit.latest_event_time(), 10);

        circuit.process_to(20).unwrap();
        circuit.clear();
        circuit.instantiate();
        assert_eq!(circuit.latest_event_time(), 10);
    }

    #[test]
    fn test_clear_keeps_configuration() {
        let circuit = circuit();
        circuit.add_component_type(ComponentType::adder()).unwrap();
        let pins: Vec<_> = (0..4).map(|_| circuit.add_pin(Signal::LOW).unwrap()).collect();
        circuit.add_component(&pins, 0).unwrap();
        circuit.push_event(1, Signal::HIGH, pins[0]).unwrap();

        circuit.clear();
        assert!(circuit.pin_ids().is_empty());
        assert!(circuit.get_all_component_connections().is_empty());
        assert_eq!(circuit.event_count(), 0);
        assert_eq!(circuit.tick_rate(), 4);
        assert!(circuit.with_network(|n| n.component_type(0).is_some()).unwrap());
    }

    #[test]
    fn test_guard_allows_reentrant_calls() {
        let circuit = circuit();
        let guard = circuit.lock();
        let pin = guard.add_pin(Signal::LOW).unwrap();
        guard.push_event(1, Signal::HIGH, pin).unwrap();
        assert_eq!(guard.process_to(1).unwrap(), 1);

        let nested = circuit.lock();
        assert_eq!(nested.get_pin_state(pin), Some(Signal::HIGH));
        drop(nested);
        guard.unlock();
    }

    #[test]
    fn test_queries_nest_inside_read_only_views() {
        let circuit = circuit();
        let guard = circuit.lock();
        let pin = guard.add_pin(Signal::LOW).unwrap();

        let seen = guard.with_patch_bay(|bay| (bay.pin_count(), guard.get_pin_state(pin)));
        assert_eq!(seen, Some((1, Some(Signal::LOW))));

        let nested = guard.with_network(|network| {
            (network.component_count(), guard.has_pin(pin), guard.event_count())
        });
        assert_eq!(nested, Some((0, true, 0)));
    }

    #[test]
    fn test_edit_inside_read_only_view_is_refused() {
        let circuit = circuit();
        let pin = circuit.add_pin(Signal::LOW).unwrap();

        let refused = circuit.with_network(|_| circuit.add_pin(Signal::HIGH));
        assert!(matches!(refused, Some(Err(TapError::StateInUse))));
        let pushed = circuit.with_patch_bay(|_| circuit.push_event(3, Signal::HIGH, pin));
        assert!(matches!(pushed, Some(Err(TapError::StateInUse))));
        assert_eq!(circuit.with_patch_bay(|_| circuit.remove_pin(pin)), Some(false));

        // nothing changed, and the circuit is still usable afterwards
        assert_eq!(circuit.pin_ids(), vec![pin]);
        assert_eq!(circuit.event_count(), 0);
        assert_eq!(circuit.latest_event_time(), 0);
        assert!(circuit.add_pin(Signal::HIGH).is_ok());
    }

    #[test]
    fn test_resume_time_steps_past_latest_event() {
        let circuit = circuit();
        assert_eq!(circuit.resume_time(), 0);

        let pin = circuit.add_pin(Signal::LOW).unwrap();
        circuit.push_event(0, Signal::HIGH, pin).unwrap();
        assert_eq!(circuit.latest_event_time(), 0);
        assert_eq!(circuit.resume_time(), 4);

        circuit.push_event(20, Signal::HIGH, pin).unwrap();
        assert_eq!(circuit.resume_time(), 24);
    }

    #[test]
    fn test_remove_pin_refused_while_wired() {
        let circuit = circuit();
        circuit.add_component_type(ComponentType::adder()).unwrap();
        let pins: Vec<_> = (0..4).map(|_| circuit.add_pin(Signal::LOW).unwrap()).collect();
        let adder = circuit.add_component(&pins, 0).unwrap();

        // the sum output is wired even though nothing listens on it
        assert!(!circuit.remove_pin(pins[0]));
        assert!(!circuit.remove_pin(pins[2]));
        assert_eq!(circuit.pin_ids(), pins);

        assert!(circuit.remove_component(adder));
        assert!(circuit.remove_pin(pins[2]));
        assert!(!circuit.has_pin(pins[2]));
    }

    #[test]
    fn test_try_lock_fails_across_threads() {
        let circuit = circuit();
        let guard = circuit.lock();

        let other = Arc::clone(&circuit);
        let acquired = std::thread::spawn(move || other.try_lock().is_some())
            .join()
            .unwrap();
        assert!(!acquired);

        drop(guard);
        let other = Arc::clone(&circuit);
        let acquired = std::thread::spawn(move || other.try_lock().is_some())
            .join()
            .unwrap();
        assert!(acquired);
    }
}

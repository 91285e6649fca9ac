//! Component instances and their wiring.

use std::sync::Arc;

use super::labeling::Labeling;
use super::patch_bay::PatchBay;
use super::types::{ComponentId, PinId};
use super::validate::{validate_component, validate_pin_labels};
use crate::components::{Component, ComponentType};
use crate::error::{Result, TapError};

/// Type index that always selects the network's wire type.
pub const WIRE_TYPE: usize = usize::MAX;

/// Owner of every component instance and the registered component types.
///
/// Every edit is validated against a [`PatchBay`] before anything changes:
/// a component only ever references live, distinct pins, and the patch
/// bay's attachment sets always mirror the components' sensitive pins.
#[derive(Debug, Clone)]
pub struct Network {
    components: Labeling<Component>,
    component_types: Labeling<Arc<ComponentType>>,
    /// Fallback for unknown type indices
    wire_type: Arc<ComponentType>,
}

impl Network {
    /// Create an empty network whose wire type is [`ComponentType::wire`].
    pub fn new() -> Self {
        Self::with_wire_type(ComponentType::wire())
    }

    /// Create an empty network with a custom wire type.
    pub fn with_wire_type(wire_type: ComponentType) -> Self {
        Self {
            components: Labeling::new(),
            component_types: Labeling::new(),
            wire_type: Arc::new(wire_type),
        }
    }

    // ============ Component Types ============

    /// Replace the registered component types. Indices follow the given order.
    pub fn set_component_types(&mut self, component_types: Vec<ComponentType>) -> Result<()> {
        for component_type in &component_types {
            component_type.validate()?;
        }
        self.component_types = component_types.into_iter().map(Arc::new).collect();
        Ok(())
    }

    /// Register a component type, returning its type index.
    pub fn add_component_type(&mut self, component_type: ComponentType) -> Result<usize> {
        component_type.validate()?;
        let index = self.component_types.add(Arc::new(component_type));
        tracing::debug!(index, "registered component type");
        Ok(index)
    }

    /// Unregister a component type. Existing instances keep their copy.
    pub fn remove_component_type(&mut self, index: usize) -> bool {
        self.component_types.remove(index)
    }

    /// The registered component type at `index`.
    pub fn component_type(&self, index: usize) -> Option<&Arc<ComponentType>> {
        self.component_types.get(index)
    }

    /// All registered component types with their indices.
    pub fn component_types(&self) -> impl Iterator<Item = (usize, &Arc<ComponentType>)> + '_ {
        self.component_types.iter()
    }

    pub fn set_wire_type(&mut self, wire_type: ComponentType) {
        self.wire_type = Arc::new(wire_type);
    }

    pub fn wire_type(&self) -> &Arc<ComponentType> {
        &self.wire_type
    }

    /// Resolve a type index, falling back to the wire type.
    fn resolve_type(&self, type_index: usize) -> Arc<ComponentType> {
        if type_index == WIRE_TYPE {
            return Arc::clone(&self.wire_type);
        }
        match self.component_types.get(type_index) {
            Some(component_type) => Arc::clone(component_type),
            None => {
                tracing::warn!(type_index, "invalid component type index, defaulting to wire type");
                Arc::clone(&self.wire_type)
            }
        }
    }

    // ============ Components ============

    /// Wire a new component of type `type_index` onto `pins`.
    ///
    /// Nothing changes unless the pins are distinct, live, and fit the
    /// type's arity. An unknown type index falls back to the wire type.
    pub fn add_component(
        &mut self,
        patch_bay: &mut PatchBay,
        pins: &[PinId],
        type_index: usize,
    ) -> Result<ComponentId> {
        let component_type = self.resolve_type(type_index);

        if let Err(e) = validate_component(patch_bay, &component_type, pins) {
            tracing::warn!(error = %e, type_name = %component_type.name, "rejected component");
            return Err(e);
        }

        let component = Component::new(component_type, pins.to_vec());
        let id = ComponentId(self.components.next_available_label());
        patch_bay.attach(&component, id);
        let label = self.components.add(component);
        debug_assert_eq!(label, id.0);

        tracing::debug!(component = %id, pins = pins.len(), "added component");
        Ok(id)
    }

    /// Rewire an existing component onto `new_pins`.
    ///
    /// The new pin list must be valid and as long as the current one; the
    /// component keeps its type.
    pub fn move_component(&mut self, patch_bay: &mut PatchBay, id: ComponentId, new_pins: &[PinId]) -> Result<()> {
        let Some(component) = self.components.get_mut(id.0) else {
            return Err(TapError::ComponentNotFound { component: id });
        };

        let check = validate_pin_labels(patch_bay, new_pins).and_then(|()| {
            if new_pins.len() == component.pins.len() {
                Ok(())
            } else {
                Err(TapError::pin_count_mismatch(
                    &component.component_type.name,
                    component.pins.len(),
                    new_pins.len(),
                ))
            }
        });
        if let Err(e) = check {
            tracing::warn!(error = %e, component = %id, "rejected component move");
            return Err(e);
        }

        patch_bay.detach(component, id);
        component.pins = new_pins.to_vec();
        patch_bay.attach(component, id);

        tracing::debug!(component = %id, "moved component");
        Ok(())
    }

    /// Detach and remove a component. Returns `false` if it did not exist.
    pub fn remove_component(&mut self, patch_bay: &mut PatchBay, id: ComponentId) -> bool {
        match self.components.take(id.0) {
            Some(component) => {
                patch_bay.detach(&component, id);
                tracing::debug!(component = %id, "removed component");
                true
            }
            None => false,
        }
    }

    /// Get a component instance.
    pub fn get_component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    pub fn has_component(&self, id: ComponentId) -> bool {
        self.components.contains(id.0)
    }

    /// Number of live components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// The registered type a component was built from, matched by name.
    ///
    /// Types can be re-registered or removed independently of the instances
    /// built from them, so the lookup goes through the type name. Falls back
    /// to the wire type when the name matches it.
    pub fn get_component_type(&self, id: ComponentId) -> Option<Arc<ComponentType>> {
        let component = self.get_component(id)?;
        let name = component.type_name();

        self.component_types
            .iter()
            .map(|(_, component_type)| component_type)
            .find(|component_type| component_type.name == name)
            .or_else(|| (self.wire_type.name == name).then_some(&self.wire_type))
            .cloned()
    }

    /// Pins a component is wired to, in order. Empty if it does not exist.
    pub fn get_component_connections(&self, id: ComponentId) -> Vec<PinId> {
        self.get_component(id)
            .map(|component| component.pins.clone())
            .unwrap_or_default()
    }

    /// Pins of every live component.
    pub fn get_all_component_connections(&self) -> Vec<(ComponentId, Vec<PinId>)> {
        self.components
            .iter()
            .map(|(label, component)| (ComponentId(label), component.pins.clone()))
            .collect()
    }

    /// Components wired to `pin`, sensitive or not.
    pub fn components_on_pin(&self, pin: PinId) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|(_, component)| component.pins.contains(&pin))
            .map(|(label, _)| ComponentId(label))
            .collect()
    }

    /// Registered type index of every live component, matched by name.
    ///
    /// `None` for components whose type is not registered (wires included).
    pub fn get_all_component_types(&self) -> Vec<(ComponentId, Option<usize>)> {
        self.components
            .iter()
            .map(|(label, component)| {
                let index = self
                    .component_types
                    .iter()
                    .find(|(_, component_type)| component_type.name == component.type_name())
                    .map(|(index, _)| index);
                (ComponentId(label), index)
            })
            .collect()
    }

    /// Remove every component. The patch bay is not touched.
    pub fn clear_components(&mut self) {
        self.components.clear();
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

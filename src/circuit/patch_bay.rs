//! Pin table, applied pin states and the pending event queue.

use std::collections::BTreeMap;

use super::labeling::Labeling;
use super::queue::EventQueue;
use super::types::{ComponentId, Event, Pin, PinId, Signal, Time};
use crate::components::Component;

/// Owner of every pin, its last applied state, and the events still to come.
///
/// The patch bay does not propagate events; it only stores them. A pin's
/// state changes when the circuit applies an event to it (or through
/// [`PatchBay::set_pin_state`]), never as a side effect of queueing.
#[derive(Debug, Clone, Default)]
pub struct PatchBay {
    pins: Labeling<Pin>,
    /// Last applied event per pin, indexed by pin label
    pin_states: Vec<Event>,
    queue: EventQueue,
}

impl PatchBay {
    /// Create an empty patch bay.
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Pins ============

    /// Add a pin holding `initial_state`, reusing the lowest free label.
    pub fn add_pin(&mut self, initial_state: Signal) -> PinId {
        let id = PinId(self.pins.next_available_label());
        let label = self.pins.add(Pin::new(id));
        debug_assert_eq!(label, id.0);

        if label >= self.pin_states.len() {
            self.pin_states.resize(label + 1, Event::new(0, Signal::default(), id));
        }
        self.pin_states[label] = Event::new(0, initial_state, id);

        tracing::debug!(pin = %id, state = %initial_state, "added pin");
        id
    }

    /// Remove a pin, freeing its label.
    ///
    /// Returns `false` if the pin does not exist or a component is still
    /// attached to it; remove or move those components first.
    pub fn remove_pin(&mut self, id: PinId) -> bool {
        let Some(pin) = self.pins.get(id.0) else {
            return false;
        };
        if !pin.components.is_empty() {
            tracing::warn!(
                pin = %id,
                components = pin.components.len(),
                "refused to remove a pin with attached components"
            );
            return false;
        }

        self.pins.take(id.0);
        self.pin_states[id.0] = Event::new(0, Signal::default(), id);
        tracing::debug!(pin = %id, "removed pin");
        true
    }

    pub fn has_pin(&self, id: PinId) -> bool {
        self.pins.contains(id.0)
    }

    /// Number of live pins.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Ids of all live pins, in order.
    pub fn pin_ids(&self) -> impl Iterator<Item = PinId> + '_ {
        self.pins.labels().map(PinId)
    }

    /// Get a pin record.
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id.0)
    }

    // ============ Pin States ============

    /// The last event applied to a live pin.
    pub fn pin_event(&self, id: PinId) -> Option<&Event> {
        if !self.has_pin(id) {
            return None;
        }
        self.pin_states.get(id.0)
    }

    pub(crate) fn pin_event_mut(&mut self, id: PinId) -> Option<&mut Event> {
        if !self.has_pin(id) {
            return None;
        }
        self.pin_states.get_mut(id.0)
    }

    /// The signal last applied to a pin.
    ///
    /// Returns `None` (and logs an error) if the pin does not exist.
    pub fn get_pin_state(&self, id: PinId) -> Option<Signal> {
        match self.pin_event(id) {
            Some(event) => Some(event.state),
            None => {
                tracing::error!(pin = %id, "attempted to get state of nonexistent pin");
                None
            }
        }
    }

    /// The applied signal of every live pin.
    pub fn all_pin_states(&self) -> BTreeMap<PinId, Signal> {
        self.pin_ids()
            .map(|id| (id, self.pin_states[id.0].state))
            .collect()
    }

    /// Overwrite a pin's applied signal without going through the queue.
    ///
    /// Returns `false` (and logs an error) if the pin does not exist.
    pub fn set_pin_state(&mut self, id: PinId, state: Signal) -> bool {
        match self.pin_event_mut(id) {
            Some(event) => {
                event.state = state;
                true
            }
            None => {
                tracing::error!(pin = %id, "attempted to set state of nonexistent pin");
                false
            }
        }
    }

    // ============ Component Attachment ============

    /// Attach `component_id` to every pin the component is sensitive to.
    ///
    /// Assumes the component's pins have been validated.
    pub fn attach(&mut self, component: &Component, component_id: ComponentId) {
        for id in component.sensitive_pins() {
            match self.pins.get_mut(id.0) {
                Some(pin) => {
                    pin.components.insert(component_id);
                }
                None => tracing::error!(pin = %id, component = %component_id, "cannot attach to missing pin"),
            }
        }
    }

    /// Detach `component_id` from every pin the component is sensitive to.
    pub fn detach(&mut self, component: &Component, component_id: ComponentId) {
        for id in component.sensitive_pins() {
            if let Some(pin) = self.pins.get_mut(id.0) {
                pin.components.remove(&component_id);
            }
        }
    }

    /// Components attached to a pin.
    pub fn get_pin_connections(&self, id: PinId) -> Vec<ComponentId> {
        self.pin(id)
            .map(|pin| pin.components.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Components attached to every live pin.
    pub fn get_all_pin_connections(&self) -> BTreeMap<PinId, Vec<ComponentId>> {
        self.pins
            .iter()
            .map(|(label, pin)| (PinId(label), pin.components.iter().copied().collect()))
            .collect()
    }

    // ============ Event Queue ============

    /// Queue an externally sourced event.
    pub fn push_event(&mut self, time: Time, state: Signal, pin: PinId) {
        self.push(Event::new(time, state, pin));
    }

    /// Queue an event as-is.
    pub fn push(&mut self, event: Event) {
        self.queue.insert(event);
    }

    /// Remove the earliest pending event without applying it.
    pub fn pop_event(&mut self) -> Option<Event> {
        self.queue.pop_minimum()
    }

    /// The earliest pending event.
    pub fn next_event(&self) -> Option<&Event> {
        self.queue.peek_minimum()
    }

    /// Number of pending events.
    pub fn event_count(&self) -> usize {
        self.queue.population()
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub(crate) fn queue_mut(&mut self) -> &mut EventQueue {
        &mut self.queue
    }

    // ============ Reset ============

    /// Remove every pin, state and pending event.
    pub fn clear(&mut self) {
        self.pins.clear();
        self.pin_states.clear();
        self.queue.clear();
    }
}

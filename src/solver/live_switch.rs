//! Gate between a real-time audio driver and a shared circuit.
//!
//! A driver may only touch the circuit once the switch is live, and the
//! switch only goes live while its circuit is instantiated and every pin the
//! driver will read or write exists. On the audio thread the switch never
//! blocks: if the lock is taken, or not enough input has been queued yet,
//! the driver gets silence for that buffer instead.

use std::sync::Arc;

use super::circuit::{Circuit, CircuitGuard};
use crate::circuit::{PinId, Time};

/// Liveness state for one driver attached to a circuit.
#[derive(Debug, Default)]
pub struct LiveSwitch {
    live: bool,
    circuit: Option<Arc<Circuit>>,
    live_pins: Vec<PinId>,
}

impl LiveSwitch {
    /// Create a switch with no circuit. It cannot go live until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a switch for `circuit` watching `live_pins`. Not yet live.
    pub fn with_circuit(circuit: Arc<Circuit>, live_pins: Vec<PinId>) -> Self {
        Self {
            live: false,
            circuit: Some(circuit),
            live_pins,
        }
    }

    pub fn get_simulator(&self) -> Option<&Arc<Circuit>> {
        self.circuit.as_ref()
    }

    /// Point the switch at another circuit.
    ///
    /// Goes offline and forgets the live pins, which belonged to the old
    /// circuit.
    pub fn set_simulator(&mut self, circuit: Option<Arc<Circuit>>) {
        self.circuit = circuit;
        self.set_live(false);
        self.set_live_pids(Vec::new());
    }

    pub fn get_live_pids(&self) -> &[PinId] {
        &self.live_pins
    }

    /// Replace the live pins, going offline if they are not all valid.
    pub fn set_live_pids(&mut self, live_pins: Vec<PinId>) {
        self.live_pins = live_pins;
        self.set_live(self.live);
    }

    pub fn get_live(&self) -> bool {
        self.live
    }

    /// Request a liveness state and return the resulting one.
    ///
    /// Going live is refused (with a logged error) unless the circuit is
    /// instantiated, the live pin list is non-empty, and every live pin
    /// exists. Going offline always succeeds.
    pub fn set_live(&mut self, live: bool) -> bool {
        self.live = live && self.can_go_live();
        self.live
    }

    fn can_go_live(&self) -> bool {
        let Some(circuit) = self.circuit.as_ref().filter(|c| c.is_instantiated()) else {
            tracing::error!(
                "circuit does not have an instantiated patch bay, cannot go live; \
                 set live after constructing a circuit"
            );
            return false;
        };

        if self.live_pins.is_empty() {
            tracing::error!("live pins are empty, cannot go live");
            return false;
        }

        let guard = circuit.lock();
        if let Some(&pin) = self.live_pins.iter().find(|&&pin| !guard.has_pin(pin)) {
            tracing::error!(%pin, "live pin does not exist in the circuit, cannot go live");
            return false;
        }

        true
    }

    /// Try to take the circuit's lock without blocking.
    ///
    /// Refuses if the switch is offline, if another thread holds the lock,
    /// or (when `end_time` is non-zero) if no event has been pushed at or
    /// after `end_time` yet. On refusal `fallback` is filled with
    /// `T::default()` so the caller can output silence.
    pub fn try_lock<T: Default + Clone>(&self, end_time: Time, fallback: &mut [T]) -> Option<CircuitGuard<'_>> {
        let guard = self.try_lock_inner(end_time);
        if guard.is_none() {
            fallback.fill(T::default());
        }
        guard
    }

    fn try_lock_inner(&self, end_time: Time) -> Option<CircuitGuard<'_>> {
        if !self.live {
            return None;
        }
        let circuit = self.circuit.as_ref()?;

        let Some(guard) = circuit.try_lock() else {
            tracing::trace!("circuit is busy, skipping buffer");
            return None;
        };

        if end_time != 0 && guard.latest_event_time() < end_time {
            tracing::trace!(
                end_time,
                latest = guard.latest_event_time(),
                "not enough input queued, skipping buffer"
            );
            return None;
        }

        Some(guard)
    }

    /// Block until the circuit's lock is available. `None` without a circuit.
    pub fn lock(&self) -> Option<CircuitGuard<'_>> {
        self.circuit.as_ref().map(|circuit| circuit.lock())
    }
}

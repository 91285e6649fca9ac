//! Adder: a four-pin component summing two inputs with carry out.
//!
//! Pins are, in order: `in0`, `in1`, `out`, `carry`. Each channel is summed
//! independently; a channel that overflows 16 bits drives its carry channel
//! high and wraps on `out`.

use crate::circuit::{ComponentId, Event, EventQueue, Signal, Time};

/// Number of pins on an adder.
pub const ADDER_PINS: usize = 4;

/// Propagation latency from an input change to `out` and `carry`.
pub const SETTLE_DELAY: Time = 3;

const OUT: usize = 2;
const CARRY: usize = 3;

fn add_channel(a: u16, b: u16) -> (u16, u16) {
    let (sum, overflow) = a.overflowing_add(b);
    (sum, if overflow { u16::MAX } else { 0 })
}

/// Emit the sum of `in0` and `in1` on `out` and the overflow flags on `carry`.
pub fn solve(inputs: &[Event], queue: &mut EventQueue, now: Time, component: ComponentId) {
    if inputs.len() < ADDER_PINS {
        tracing::warn!(%component, pins = inputs.len(), "adder needs {} pins", ADDER_PINS);
        return;
    }

    let (a, b) = (inputs[0].state, inputs[1].state);
    let (left, carry_left) = add_channel(a.left, b.left);
    let (right, carry_right) = add_channel(a.right, b.right);

    let time = now + SETTLE_DELAY;
    queue.insert(Event::from_component(
        time,
        Signal::new(left, right),
        inputs[OUT].pin,
        component,
    ));
    queue.insert(Event::from_component(
        time,
        Signal::new(carry_left, carry_right),
        inputs[CARRY].pin,
        component,
    ));
}

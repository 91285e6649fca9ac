//! Audio-rate adapters between a sound driver and a circuit.
//!
//! [`TapIn`] converts incoming samples into events on input pins, one frame
//! every `tick_rate` ticks. [`TapOut`] advances the simulation frame by frame
//! and mixes the output pins back into samples. Both go through a
//! [`LiveSwitch`](crate::solver::LiveSwitch), so they never block the audio
//! thread and output silence whenever the circuit is unavailable.

mod tap_in;
mod tap_out;

pub use tap_in::{TapIn, TapInConfig};
pub use tap_out::{TapOut, TapOutConfig};

//! # Tapsim Core
//!
//! An event-driven logic circuit simulator that can be played as an audio
//! effect.
//!
//! This library provides:
//! - A patch bay of pins carrying two-channel 16-bit signals
//! - A network of components (wires, adders, host-defined solvers) wired
//!   onto those pins
//! - A discrete-event engine that propagates timestamped pin changes
//! - Audio taps that feed samples into a circuit and read them back out
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Pins, events, the event queue and component wiring
//! - [`components`] - Component types and their solvers
//! - [`solver`] - The propagation engine and its shared-access lock
//! - [`tap`] - Real-time producer and consumer adapters
//! - [`audio`] - Raw PCM audio I/O (CLI only)
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! ffmpeg -i input.wav -f f32le -ac 1 -ar 48000 - | tapsim --preset wire | ffmpeg -f f32le -ac 1 -ar 48000 -i - output.wav
//! ```
//!
//! ### Library
//!
//! ```
//! use tapsim_core::{Circuit, CircuitConfig, Signal, WIRE_TYPE};
//!
//! let circuit = Circuit::instantiated(CircuitConfig::new());
//! let a = circuit.add_pin(Signal::LOW).unwrap();
//! let b = circuit.add_pin(Signal::LOW).unwrap();
//! circuit.add_component(&[a, b], WIRE_TYPE).unwrap();
//!
//! circuit.push_event(5, Signal::HIGH, a).unwrap();
//! circuit.process_to(6).unwrap();
//! assert_eq!(circuit.get_pin_state(b), Some(Signal::HIGH));
//! ```
//!
//! ## Time
//!
//! Simulation time is an unsigned tick count. One audio frame spans
//! `tick_rate` ticks, so component delays (a wire takes 1 tick, an adder 3)
//! are far shorter than a frame and settle between samples.

pub mod circuit;
pub mod components;
pub mod error;
pub mod solver;
pub mod tap;

#[cfg(feature = "cli")]
pub mod audio;

// Re-export main types for convenience
pub use circuit::{ComponentId, Event, PinId, Signal, Time, WIRE_TYPE};
pub use components::{ComponentType, SolverKind, SolverRegistry};
pub use error::{Result, TapError};
pub use solver::{Circuit, CircuitConfig, CircuitGuard, LiveSwitch};
pub use tap::{TapIn, TapInConfig, TapOut, TapOutConfig};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCircuit;

/// Default number of simulation ticks per audio frame.
pub const DEFAULT_TICK_RATE: Time = 1024;

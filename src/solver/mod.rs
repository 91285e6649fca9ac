//! Event-driven propagation engine.
//!
//! This module provides the simulation side of the crate.
//!
//! ## Propagation
//!
//! A [`Circuit`] repeatedly takes the earliest pending event and:
//!
//! 1. Applies it: the target pin's state becomes the event
//! 2. Resolves it: every component sensitive to that pin, except the one
//!    that emitted the event, gets a snapshot of all its pin states and runs
//!    its solver, which may queue further events
//!
//! Events therefore apply in non-decreasing time order, and equal times in
//! the order they were queued. Only the emitting component is excluded from
//! resolution, so a loop through two or more components can oscillate.
//!
//! ## Concurrency
//!
//! One reentrant lock guards each circuit. Editors lock and wait; real-time
//! drivers go through a [`LiveSwitch`], which only ever tries the lock and
//! tells the driver to output silence when it cannot get it.

mod circuit;
mod live_switch;

pub use circuit::{Circuit, CircuitConfig, CircuitGuard};
pub use live_switch::LiveSwitch;

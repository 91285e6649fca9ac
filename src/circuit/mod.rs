//! Circuit graph representation and validation.
//!
//! This module provides the data side of the simulator: the label allocator,
//! the pin table with its event queue ([`PatchBay`]), and the component
//! wiring ([`Network`]). Event propagation lives in [`crate::solver`].

mod labeling;
mod network;
mod patch_bay;
mod queue;
mod types;
mod validate;

pub use labeling::Labeling;
pub use network::{Network, WIRE_TYPE};
pub use patch_bay::PatchBay;
pub use queue::EventQueue;
pub use types::*;
pub use validate::{validate_arity, validate_component, validate_pin_labels};

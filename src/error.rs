//! Error types for the Tapsim circuit simulator.
//!
//! This module provides a unified error type [`TapError`] covering the
//! rejections that can happen while building a circuit and the I/O failures
//! of the command line adapter.
//!
//! Problems found while events propagate are not errors: they are logged and
//! the offending step is skipped.

use thiserror::Error;

use crate::circuit::{ComponentId, PinId};

/// Result type alias using [`TapError`].
pub type Result<T> = std::result::Result<T, TapError>;

/// Unified error type for all Tapsim operations.
#[derive(Error, Debug)]
pub enum TapError {
    // ============ Construction Errors ============
    /// The circuit has no network or patch bay yet
    #[error("Circuit is not instantiated (call instantiate() first)")]
    NotInstantiated,

    /// A circuit call was made from inside a read-only view of the same
    /// circuit and needed to modify it
    #[error("Circuit state is already borrowed by an enclosing call")]
    StateInUse,

    /// A pin id appears more than once in a pin list
    #[error("Pin {pin} appears more than once in the pin list")]
    DuplicatePin { pin: PinId },

    /// A pin id does not name a live pin
    #[error("Pin {pin} does not exist in the patch bay")]
    PinNotFound { pin: PinId },

    /// A fixed-arity component type was given the wrong number of pins
    #[error("Component type '{type_name}' expects {expected} pins, got {actual}")]
    PinCountMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    /// A variable-arity (wire) component was given no pins
    #[error("Wire component type '{type_name}' needs at least one pin")]
    EmptyWire { type_name: String },

    /// A component id does not name a live component
    #[error("Component {component} does not exist in the network")]
    ComponentNotFound { component: ComponentId },

    /// A sensitivity mask names a pin index past the declared pin count
    #[error("Sensitive pin index {index} is out of range for component type '{type_name}'")]
    InvalidSensitivity { type_name: String, index: usize },

    /// No solver is registered under the requested name
    #[error("Solver function '{name}' not found in registry")]
    UnknownSolver { name: String },

    // ============ I/O Errors ============
    /// Error reading audio input
    #[error("Audio input error: {message}")]
    AudioInputError { message: String },

    /// Error writing audio output
    #[error("Audio output error: {message}")]
    AudioOutputError { message: String },
}

impl TapError {
    /// Create a pin count mismatch error
    pub fn pin_count_mismatch(type_name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::PinCountMismatch {
            type_name: type_name.into(),
            expected,
            actual,
        }
    }

    /// Create an unknown solver error
    pub fn unknown_solver(name: impl Into<String>) -> Self {
        Self::UnknownSolver { name: name.into() }
    }

    /// Check if this error is a construction-time validation rejection.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicatePin { .. }
                | Self::PinNotFound { .. }
                | Self::PinCountMismatch { .. }
                | Self::EmptyWire { .. }
                | Self::InvalidSensitivity { .. }
        )
    }
}

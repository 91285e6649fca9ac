//! Pin list validation for component wiring.

use std::collections::HashSet;

use super::patch_bay::PatchBay;
use super::types::PinId;
use crate::components::ComponentType;
use crate::error::{Result, TapError};

/// Validate a pin list against a patch bay.
///
/// Checks:
/// - No pin id appears twice
/// - Every pin id names a live pin
pub fn validate_pin_labels(patch_bay: &PatchBay, pins: &[PinId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(pins.len());

    for &pin in pins {
        if !seen.insert(pin) {
            return Err(TapError::DuplicatePin { pin });
        }
        if !patch_bay.has_pin(pin) {
            return Err(TapError::PinNotFound { pin });
        }
    }

    Ok(())
}

/// Validate that a pin list fits a component type's arity.
///
/// Variable-arity types need at least one pin; fixed-arity types need
/// exactly `pin_count`.
pub fn validate_arity(component_type: &ComponentType, pin_count: usize) -> Result<()> {
    if component_type.is_variable_arity() {
        if pin_count == 0 {
            return Err(TapError::EmptyWire {
                type_name: component_type.name.clone(),
            });
        }
    } else if pin_count != component_type.pin_count {
        return Err(TapError::pin_count_mismatch(
            &component_type.name,
            component_type.pin_count,
            pin_count,
        ));
    }

    Ok(())
}

/// Validate a pin list for a component of the given type.
pub fn validate_component(patch_bay: &PatchBay, component_type: &ComponentType, pins: &[PinId]) -> Result<()> {
    validate_pin_labels(patch_bay, pins)?;
    validate_arity(component_type, pins.len())
}

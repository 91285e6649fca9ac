//! WASM bindings for Tapsim Core.
//!
//! This module provides JavaScript-friendly bindings for building and
//! stepping a circuit from a browser, for example to drive a visual editor
//! or an AudioWorklet.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCircuit } from 'tapsim_core';
//!
//! await init();
//!
//! const circuit = new WasmCircuit(1024);
//! const a = circuit.add_pin(0);
//! const b = circuit.add_pin(0);
//! circuit.add_wire(new Uint32Array([a, b]));
//!
//! circuit.push_level(5, 0xffff, a);
//! circuit.process_to(6);
//! circuit.pin_level(b); // 0xffff
//! ```

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use crate::circuit::{PinId, Signal, Time, WIRE_TYPE};
use crate::components::ComponentType;
use crate::error::TapError;
use crate::solver::{Circuit, CircuitConfig};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(e: TapError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn pins_from_js(pins: &[u32]) -> Vec<PinId> {
    pins.iter().map(|&pin| PinId(pin as usize)).collect()
}

/// WASM-compatible circuit handle.
///
/// Pins and components are addressed by their numeric labels. Signals are
/// exposed as a single 16-bit level applied to both channels.
#[wasm_bindgen]
pub struct WasmCircuit {
    circuit: Arc<Circuit>,
}

#[wasm_bindgen]
impl WasmCircuit {
    /// Create an empty, instantiated circuit.
    ///
    /// # Arguments
    /// * `tick_rate` - Simulation ticks per audio frame
    #[wasm_bindgen(constructor)]
    pub fn new(tick_rate: u32) -> WasmCircuit {
        let config = CircuitConfig::new().with_tick_rate(Time::from(tick_rate));
        WasmCircuit {
            circuit: Circuit::instantiated(config),
        }
    }

    /// Add a pin with the given initial level and return its label.
    #[wasm_bindgen]
    pub fn add_pin(&self, level: u16) -> Result<u32, JsValue> {
        let pin = self.circuit.add_pin(Signal::splat(level)).map_err(to_js)?;
        Ok(pin.0 as u32)
    }

    #[wasm_bindgen]
    pub fn remove_pin(&self, pin: u32) -> bool {
        self.circuit.remove_pin(PinId(pin as usize))
    }

    /// Register the built-in adder type and return its type index.
    #[wasm_bindgen]
    pub fn register_adder(&self) -> Result<u32, JsValue> {
        let index = self
            .circuit
            .add_component_type(ComponentType::adder())
            .map_err(to_js)?;
        Ok(index as u32)
    }

    /// Add a component of a registered type and return its label.
    #[wasm_bindgen]
    pub fn add_component(&self, pins: &[u32], type_index: u32) -> Result<u32, JsValue> {
        let component = self
            .circuit
            .add_component(&pins_from_js(pins), type_index as usize)
            .map_err(to_js)?;
        Ok(component.0 as u32)
    }

    /// Add a wire joining `pins` and return its label.
    #[wasm_bindgen]
    pub fn add_wire(&self, pins: &[u32]) -> Result<u32, JsValue> {
        let component = self
            .circuit
            .add_component(&pins_from_js(pins), WIRE_TYPE)
            .map_err(to_js)?;
        Ok(component.0 as u32)
    }

    #[wasm_bindgen]
    pub fn remove_component(&self, component: u32) -> bool {
        self.circuit
            .remove_component(crate::circuit::ComponentId(component as usize))
    }

    /// Schedule a level change on a pin.
    ///
    /// Times arrive as JS numbers; negative values are clamped to zero.
    #[wasm_bindgen]
    pub fn push_level(&self, time: f64, level: u16, pin: u32) -> Result<(), JsValue> {
        self.circuit
            .push_event(time.max(0.0) as Time, Signal::splat(level), PinId(pin as usize))
            .map_err(to_js)
    }

    /// Apply all events up to and including `end_time`. Returns how many
    /// were applied.
    #[wasm_bindgen]
    pub fn process_to(&self, end_time: f64) -> Result<u32, JsValue> {
        let count = self
            .circuit
            .process_to(end_time.max(0.0) as Time)
            .map_err(to_js)?;
        Ok(count as u32)
    }

    /// Current level of a pin, or `undefined` if it does not exist.
    #[wasm_bindgen]
    pub fn pin_level(&self, pin: u32) -> Option<u16> {
        self.circuit
            .get_pin_state(PinId(pin as usize))
            .map(|state| state.left)
    }

    /// Current state of a pin as an audio sample.
    #[wasm_bindgen]
    pub fn pin_sample(&self, pin: u32) -> Option<f32> {
        self.circuit
            .get_pin_state(PinId(pin as usize))
            .map(Signal::to_sample)
    }

    /// Labels of every pin, in ascending order.
    #[wasm_bindgen]
    pub fn pin_ids(&self) -> Vec<u32> {
        self.circuit.pin_ids().into_iter().map(|pin| pin.0 as u32).collect()
    }

    #[wasm_bindgen(getter)]
    pub fn latest_event_time(&self) -> f64 {
        self.circuit.latest_event_time() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn event_count(&self) -> u32 {
        self.circuit.event_count() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn tick_rate(&self) -> f64 {
        self.circuit.tick_rate() as f64
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Get the default tick rate.
#[wasm_bindgen]
pub fn default_tick_rate() -> f64 {
    crate::DEFAULT_TICK_RATE as f64
}

//! Consumer: advances the simulation and reads output pins as audio.

use std::sync::Arc;

use crate::circuit::{PinId, Time};
use crate::solver::{Circuit, LiveSwitch};

/// Configuration for a [`TapOut`].
#[derive(Debug, Clone)]
pub struct TapOutConfig {
    sample_skip: usize,
}

impl Default for TapOutConfig {
    fn default() -> Self {
        Self { sample_skip: 1 }
    }
}

impl TapOutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate and sample only every `sample_skip`-th frame; the frames in
    /// between repeat the last sampled value. Clamped to at least 1.
    pub fn with_sample_skip(mut self, sample_skip: usize) -> Self {
        self.sample_skip = sample_skip.max(1);
        self
    }

    pub fn sample_skip(&self) -> usize {
        self.sample_skip
    }
}

/// Simulates up to each frame's time and writes the sum of the output
/// pins' signals.
///
/// The consumer runs one frame behind the producer: frame `i` is simulated
/// up to `total_time + i * tick_rate`, the time the producer stamped on the
/// matching input frame.
#[derive(Debug)]
pub struct TapOut {
    switch: LiveSwitch,
    config: TapOutConfig,
    total_time: Time,
    tick_rate: Time,
}

impl TapOut {
    /// Create a consumer reading `output_pins` of `circuit`. Not yet live.
    pub fn new(circuit: Arc<Circuit>, output_pins: Vec<PinId>) -> Self {
        Self::with_config(circuit, output_pins, TapOutConfig::default())
    }

    pub fn with_config(circuit: Arc<Circuit>, output_pins: Vec<PinId>, config: TapOutConfig) -> Self {
        Self {
            switch: LiveSwitch::with_circuit(circuit, output_pins),
            config,
            total_time: 0,
            tick_rate: 0,
        }
    }

    /// Go live, continuing one tick after the circuit's latest event.
    ///
    /// The circuit's tick rate is read here, so restart after changing it.
    pub fn start(&mut self) -> bool {
        if self.switch.set_live(true) {
            if let Some(circuit) = self.switch.get_simulator() {
                self.total_time = circuit.resume_time();
                self.tick_rate = circuit.tick_rate();
            }
        }
        self.switch.get_live()
    }

    pub fn stop(&mut self) {
        self.switch.set_live(false);
    }

    pub fn is_playing(&self) -> bool {
        self.switch.get_live()
    }

    /// Simulation time of the next buffer's first frame.
    pub fn total_time(&self) -> Time {
        self.total_time
    }

    pub fn switch(&self) -> &LiveSwitch {
        &self.switch
    }

    pub fn switch_mut(&mut self) -> &mut LiveSwitch {
        &mut self.switch
    }

    /// Fill `out` with one buffer of output samples.
    ///
    /// If the circuit is busy, or the producer has not queued input up to
    /// this buffer's last frame, `out` is silenced and time does not
    /// advance. Returns the number of frames produced.
    pub fn process(&mut self, out: &mut [f32]) -> usize {
        if out.is_empty() {
            return 0;
        }

        let tick_rate = self.tick_rate;
        let horizon = self.total_time + (out.len() - 1) as Time * tick_rate;

        let Some(guard) = self.switch.try_lock(horizon, out) else {
            return 0;
        };

        let pins = self.switch.get_live_pids();
        let sample_skip = self.config.sample_skip.max(1);
        let mut held = 0.0f32;
        for (i, frame) in out.iter_mut().enumerate() {
            if i % sample_skip == 0 {
                let time = self.total_time + i as Time * tick_rate;
                if let Err(e) = guard.process_to(time) {
                    tracing::error!(error = %e, "failed to advance circuit");
                }
                held = pins
                    .iter()
                    .filter_map(|&pin| guard.get_pin_state(pin))
                    .map(|state| state.to_sample())
                    .sum::<f32>();
            }
            *frame = held;
        }

        self.total_time += out.len() as Time * tick_rate;
        out.len()
    }
}

//! Producer: turns audio frames into events on input pins.

use std::sync::Arc;

use crate::circuit::{PinId, Signal, Time};
use crate::solver::{Circuit, LiveSwitch};

/// Configuration for a [`TapIn`].
#[derive(Debug, Clone)]
pub struct TapInConfig {
    activation_delta: f32,
    sample_skip: usize,
    line_in: bool,
    line_out: bool,
}

impl Default for TapInConfig {
    fn default() -> Self {
        Self {
            activation_delta: 0.0,
            sample_skip: 1,
            line_in: true,
            line_out: false,
        }
    }
}

impl TapInConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame only if it differs from the last pushed frame by at
    /// least `activation_delta`, summed over both channels.
    ///
    /// Negative values are treated as 0, which pushes every sampled frame.
    pub fn with_activation_delta(mut self, activation_delta: f32) -> Self {
        self.activation_delta = activation_delta.max(0.0);
        self
    }

    /// Look at only every `sample_skip`-th frame (clamped to at least 1).
    pub fn with_sample_skip(mut self, sample_skip: usize) -> Self {
        self.sample_skip = sample_skip.max(1);
        self
    }

    /// When false, nothing is pushed into the circuit.
    pub fn with_line_in(mut self, line_in: bool) -> Self {
        self.line_in = line_in;
        self
    }

    /// When true, [`TapIn::process`] passes its input through unchanged.
    pub fn with_line_out(mut self, line_out: bool) -> Self {
        self.line_out = line_out;
        self
    }

    pub fn activation_delta(&self) -> f32 {
        self.activation_delta
    }

    pub fn sample_skip(&self) -> usize {
        self.sample_skip
    }

    pub fn line_in(&self) -> bool {
        self.line_in
    }

    pub fn line_out(&self) -> bool {
        self.line_out
    }
}

/// Pushes audio frames as events on every input pin.
///
/// Frame `i` of a buffer lands at `current_time + i * tick_rate`. Every
/// `sample_skip`-th frame is considered, and pushed only if it moved far
/// enough from the last pushed frame. The last frame of each buffer is
/// always pushed, so a consumer waiting for the buffer's end time is never
/// starved by a quiet input.
#[derive(Debug)]
pub struct TapIn {
    switch: LiveSwitch,
    config: TapInConfig,
    current_time: Time,
    last_activation: (f32, f32),
}

impl TapIn {
    /// Create a producer writing to `input_pins` of `circuit`. Not yet live.
    pub fn new(circuit: Arc<Circuit>, input_pins: Vec<PinId>) -> Self {
        Self::with_config(circuit, input_pins, TapInConfig::default())
    }

    pub fn with_config(circuit: Arc<Circuit>, input_pins: Vec<PinId>, config: TapInConfig) -> Self {
        Self {
            switch: LiveSwitch::with_circuit(circuit, input_pins),
            config,
            current_time: 0,
            last_activation: (0.0, 0.0),
        }
    }

    /// Go live, continuing one tick after the circuit's latest event.
    pub fn start(&mut self) -> bool {
        if self.switch.set_live(true) {
            if let Some(circuit) = self.switch.get_simulator() {
                self.current_time = circuit.resume_time();
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

    /// Time the next buffer's first frame will be stamped with.
    pub fn current_time(&self) -> Time {
        self.current_time
    }

    pub fn config(&self) -> &TapInConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TapInConfig) {
        self.config = config;
    }

    pub fn switch(&self) -> &LiveSwitch {
        &self.switch
    }

    pub fn switch_mut(&mut self) -> &mut LiveSwitch {
        &mut self.switch
    }

    /// Handle one buffer the way an inline audio effect would: push `input`
    /// (if line in is on), then fill `output` with `input` when line out is
    /// on, or with silence otherwise.
    ///
    /// Returns the number of frames pushed, as [`TapIn::mix`].
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        let pushed = if self.config.line_in { self.mix(input) } else { 0 };

        if self.config.line_out {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            output[n..].fill(0.0);
        } else {
            output.fill(0.0);
        }
        pushed
    }

    /// Push one buffer of mono samples, the same on both channels.
    ///
    /// Returns the number of frames pushed. If the circuit cannot be locked
    /// right now, or line in is off, nothing is pushed and time does not
    /// advance.
    pub fn mix(&mut self, frames: &[f32]) -> usize {
        self.push_frames(frames.len(), |i| (frames[i], frames[i]))
    }

    /// Push one buffer of stereo frames. See [`TapIn::mix`].
    pub fn mix_stereo(&mut self, frames: &[(f32, f32)]) -> usize {
        self.push_frames(frames.len(), |i| frames[i])
    }

    fn push_frames(&mut self, len: usize, frame: impl Fn(usize) -> (f32, f32)) -> usize {
        if len == 0 || !self.config.line_in {
            return 0;
        }
        let Some(guard) = self.switch.try_lock::<f32>(0, &mut []) else {
            return 0;
        };

        let tick_rate = guard.tick_rate();
        let pins = self.switch.get_live_pids();
        let last = len - 1;
        let sampled = (0..len)
            .step_by(self.config.sample_skip)
            .chain((last % self.config.sample_skip != 0).then_some(last));

        let mut pushed = 0;
        for i in sampled {
            let (left, right) = frame(i);
            let delta = (left - self.last_activation.0).abs() + (right - self.last_activation.1).abs();
            if delta < self.config.activation_delta && i != last {
                continue;
            }

            let time = self.current_time + i as Time * tick_rate;
            let state = Signal::from_stereo(left, right);
            for &pin in pins {
                if let Err(e) = guard.push_event(time, state, pin) {
                    tracing::error!(error = %e, "failed to push input frame");
                }
            }
            self.last_activation = (left, right);
            pushed += 1;
        }

        self.current_time += len as Time * tick_rate;
        pushed
    }
}

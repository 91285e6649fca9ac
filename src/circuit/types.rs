//! Core types for circuit representation.

use std::collections::BTreeSet;
use std::fmt;

/// Simulated time, counted in ticks.
///
/// One audio sample spans `tick_rate` ticks (see [`crate::CircuitConfig`]).
pub type Time = u64;

/// A unique identifier for a pin in the patch bay.
///
/// Pin ids are labels: a removed pin's id is handed out again to the next
/// pin that is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinId(pub usize);

impl PinId {
    /// Numeric sentinel for adapters that cannot carry an `Option`.
    pub const INVALID: PinId = PinId(usize::MAX);
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A unique identifier for a component in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

impl ComponentId {
    /// Numeric sentinel returned to adapters when a component is rejected.
    pub const INVALID: ComponentId = ComponentId(usize::MAX);
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// A two-channel 16-bit signal level carried by a pin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signal {
    pub left: u16,
    pub right: u16,
}

impl Signal {
    /// Full-scale level on both channels.
    pub const HIGH: Signal = Signal::splat(u16::MAX);

    /// Zero level on both channels.
    pub const LOW: Signal = Signal::splat(0);

    const SAMPLE_SCALE: f64 = 0x7FFF as f64;

    /// Create a signal from its two channel levels.
    pub const fn new(left: u16, right: u16) -> Self {
        Self { left, right }
    }

    /// Create a signal with the same level on both channels.
    pub const fn splat(level: u16) -> Self {
        Self::new(level, level)
    }

    /// Map an audio sample in [-1, 1] onto a channel level.
    ///
    /// Out-of-range samples are clamped.
    pub fn level_from_sample(sample: f32) -> u16 {
        let clamped = f64::from(sample).clamp(-1.0, 1.0) + 1.0;
        (clamped * Self::SAMPLE_SCALE) as u16 + 1
    }

    /// Inverse of [`Signal::level_from_sample`].
    pub fn sample_from_level(level: u16) -> f32 {
        (f64::from(level) / Self::SAMPLE_SCALE - 1.0) as f32
    }

    /// Create a signal carrying a mono audio sample on both channels.
    pub fn from_sample(sample: f32) -> Self {
        Self::splat(Self::level_from_sample(sample))
    }

    /// Create a signal from a stereo pair of audio samples.
    pub fn from_stereo(left: f32, right: f32) -> Self {
        Self::new(Self::level_from_sample(left), Self::level_from_sample(right))
    }

    /// The left channel as an audio sample.
    pub fn to_sample(self) -> f32 {
        Self::sample_from_level(self.left)
    }

    /// Both channels as audio samples.
    pub fn to_stereo(self) -> (f32, f32) {
        (
            Self::sample_from_level(self.left),
            Self::sample_from_level(self.right),
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:#06x}, {:#06x})", self.left, self.right)
    }
}

/// A state change scheduled on a pin.
///
/// `source` names the component that emitted the event, so that the
/// component is not re-triggered by its own output. Events pushed from
/// outside the circuit have no source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: Time,
    pub state: Signal,
    pub pin: PinId,
    pub source: Option<ComponentId>,
}

impl Event {
    /// Create an externally sourced event.
    pub fn new(time: Time, state: Signal, pin: PinId) -> Self {
        Self {
            time,
            state,
            pin,
            source: None,
        }
    }

    /// Create an event emitted by a component.
    pub fn from_component(time: Time, state: Signal, pin: PinId, source: ComponentId) -> Self {
        Self {
            time,
            state,
            pin,
            source: Some(source),
        }
    }
}

/// A connection point in the patch bay.
///
/// Only components that are *sensitive* to this pin are listed in
/// `components`; those are the components re-solved when an event is
/// applied here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub id: PinId,
    pub components: BTreeSet<ComponentId>,
}

impl Pin {
    /// Create a pin with no attached components.
    pub fn new(id: PinId) -> Self {
        Self {
            id,
            components: BTreeSet::new(),
        }
    }
}

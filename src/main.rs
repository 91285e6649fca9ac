//! Tapsim - audio-rate logic circuit simulator
//!
//! Streams raw audio through a small preset circuit.
//!
//! # Usage
//!
//! ```bash
//! ffmpeg -i input.wav -f f32le -ac 1 -ar 48000 - | tapsim --preset adder | ffmpeg -f f32le -ac 1 -ar 48000 -i - output.wav
//! ```
//!
//! Set `RUST_LOG` (for example `RUST_LOG=tapsim_core=debug`) to control the
//! diagnostics written to stderr.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tapsim_core::{
    audio::{process_audio, BUFFER_SIZE},
    components::ComponentType,
    error::Result,
    Circuit, CircuitConfig, PinId, Signal, TapIn, TapInConfig, TapOut, TapOutConfig,
    DEFAULT_TICK_RATE,
    WIRE_TYPE,
};
use tracing_subscriber::EnvFilter;

/// Built-in circuits the CLI can run.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Preset {
    /// Input and output joined by one wire
    Wire,
    /// Input fed to both adder inputs, sum to the output
    Adder,
}

/// Audio-rate logic circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Circuit to run the audio through
    #[arg(short, long, value_enum, default_value_t = Preset::Wire)]
    preset: Preset,

    /// Simulation ticks per audio frame
    #[arg(short, long, default_value_t = DEFAULT_TICK_RATE)]
    tick_rate: u64,

    /// Only simulate every Nth output frame, holding the value in between
    #[arg(short, long, default_value_t = 1)]
    sample_skip: usize,

    /// Only feed every Nth input frame into the circuit
    #[arg(short, long, default_value_t = 1)]
    input_skip: usize,

    /// Minimum change (summed over both channels) before an input frame is
    /// fed into the circuit
    #[arg(short, long, default_value_t = 0.0)]
    activation_delta: f32,

    /// Samples per processing block
    #[arg(short, long, default_value_t = BUFFER_SIZE)]
    block_size: usize,
}

/// Build `preset` and return its input and output pins.
fn build_preset(circuit: &Circuit, preset: Preset) -> Result<(Vec<PinId>, Vec<PinId>)> {
    let silence = Signal::from_sample(0.0);
    match preset {
        Preset::Wire => {
            let input = circuit.add_pin(silence)?;
            let output = circuit.add_pin(silence)?;
            circuit.add_component(&[input, output], WIRE_TYPE)?;
            Ok((vec![input], vec![output]))
        }
        Preset::Adder => {
            let adder = circuit.add_component_type(ComponentType::adder())?;
            let a = circuit.add_pin(silence)?;
            let b = circuit.add_pin(silence)?;
            let sum = circuit.add_pin(silence)?;
            let carry = circuit.add_pin(silence)?;
            circuit.add_component(&[a, b, sum, carry], adder)?;
            Ok((vec![a, b], vec![sum]))
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Build the circuit
    let config = CircuitConfig::new().with_tick_rate(args.tick_rate);
    let circuit = Circuit::instantiated(config);
    let (inputs, outputs) = build_preset(&circuit, args.preset)?;
    tracing::info!(preset = ?args.preset, tick_rate = args.tick_rate, "circuit ready");

    // Attach the taps
    let in_config = TapInConfig::new()
        .with_sample_skip(args.input_skip)
        .with_activation_delta(args.activation_delta);
    let mut tap_in = TapIn::with_config(Arc::clone(&circuit), inputs, in_config);
    let tap_config = TapOutConfig::new().with_sample_skip(args.sample_skip);
    let mut tap_out = TapOut::with_config(Arc::clone(&circuit), outputs, tap_config);
    tap_in.start();
    tap_out.start();

    // Process audio
    process_audio(&mut tap_in, &mut tap_out, args.block_size)?;

    Ok(())
}

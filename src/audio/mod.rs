//! Audio I/O for the CLI frontend.
//!
//! Reads raw mono f32le PCM from stdin, streams it through a circuit's taps
//! and writes the result to stdout in the same format.

use std::io::{self, Read, Write};

use crate::error::{Result, TapError};
use crate::tap::{TapIn, TapOut};

/// Default block size for audio processing (in samples).
pub const BUFFER_SIZE: usize = 256;

const BYTES_PER_SAMPLE: usize = 4;

/// Audio input reader.
pub struct AudioInput<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl AudioInput<io::Stdin> {
    /// Reader over stdin.
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<R: Read> AudioInput<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: vec![0u8; BUFFER_SIZE * BYTES_PER_SAMPLE],
        }
    }

    /// Read a block of samples.
    /// Returns the number of samples read, or 0 on EOF. A trailing partial
    /// sample at EOF is dropped.
    pub fn read_block(&mut self, samples: &mut [f32]) -> Result<usize> {
        let bytes_wanted = samples.len() * BYTES_PER_SAMPLE;
        if self.buffer.len() < bytes_wanted {
            self.buffer.resize(bytes_wanted, 0);
        }
        let buffer = &mut self.buffer[..bytes_wanted];

        let mut filled = 0;
        while filled < bytes_wanted {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TapError::AudioInputError {
                        message: e.to_string(),
                    })
                }
            }
        }

        let samples_read = filled / BYTES_PER_SAMPLE;
        for (sample, bytes) in samples
            .iter_mut()
            .zip(buffer[..samples_read * BYTES_PER_SAMPLE].chunks_exact(BYTES_PER_SAMPLE))
        {
            *sample = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        Ok(samples_read)
    }
}

/// Audio output writer.
pub struct AudioOutput<W> {
    writer: W,
    buffer: Vec<u8>,
}

impl AudioOutput<io::Stdout> {
    /// Writer over stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AudioOutput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buffer: Vec::with_capacity(BUFFER_SIZE * BYTES_PER_SAMPLE),
        }
    }

    /// Write a block of samples.
    pub fn write_block(&mut self, samples: &[f32]) -> Result<()> {
        self.buffer.clear();
        self.buffer
            .extend(samples.iter().flat_map(|sample| sample.to_le_bytes()));

        self.writer
            .write_all(&self.buffer)
            .map_err(|e| TapError::AudioOutputError {
                message: e.to_string(),
            })
    }

    /// Flush the output stream.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| TapError::AudioOutputError {
            message: e.to_string(),
        })
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Stream every block from `input` through the taps into `output`.
///
/// Each block is first pushed through `tap_in`, then drained from
/// `tap_out`. Blocks a tap refuses come out as silence. Returns the number
/// of samples written.
pub fn stream_audio<R: Read, W: Write>(
    input: &mut AudioInput<R>,
    output: &mut AudioOutput<W>,
    tap_in: &mut TapIn,
    tap_out: &mut TapOut,
    block_size: usize,
) -> Result<usize> {
    let block_size = block_size.max(1);
    let mut in_samples = vec![0.0f32; block_size];
    let mut out_samples = vec![0.0f32; block_size];
    let mut total = 0;

    loop {
        let samples_read = input.read_block(&mut in_samples)?;
        if samples_read == 0 {
            break;
        }

        let pushed = tap_in.mix(&in_samples[..samples_read]);
        let produced = tap_out.process(&mut out_samples[..samples_read]);
        if pushed == 0 || produced == 0 {
            tracing::debug!(samples_read, pushed, produced, "block dropped to silence");
        }

        output.write_block(&out_samples[..samples_read])?;
        total += samples_read;
    }

    output.flush()?;
    tracing::info!(samples = total, "finished streaming audio");
    Ok(total)
}

/// Process audio from stdin to stdout through the given taps.
pub fn process_audio(tap_in: &mut TapIn, tap_out: &mut TapOut, block_size: usize) -> Result<()> {
    let mut input = AudioInput::stdin();
    let mut output = AudioOutput::stdout();
    stream_audio(&mut input, &mut output, tap_in, tap_out, block_size)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Signal, WIRE_TYPE};
    use crate::solver::{Circuit, CircuitConfig};
    use std::sync::Arc;

    fn encode(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn decode(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    #[test]
    fn test_read_block_drops_partial_sample() {
        let mut bytes = encode(&[0.25, -0.5]);
        bytes.push(0xAB);
        let mut input = AudioInput::new(bytes.as_slice());

        let mut samples = [0.0f32; 4];
        assert_eq!(input.read_block(&mut samples).unwrap(), 2);
        assert_eq!(&samples[..2], &[0.25, -0.5]);
        assert_eq!(input.read_block(&mut samples).unwrap(), 0);
    }

    #[test]
    fn test_stream_through_wire() {
        let circuit = Circuit::instantiated(CircuitConfig::new());
        let a = circuit.add_pin(Signal::from_sample(0.0)).unwrap();
        let b = circuit.add_pin(Signal::from_sample(0.0)).unwrap();
        circuit.add_component(&[a, b], WIRE_TYPE).unwrap();

        let mut tap_in = TapIn::new(Arc::clone(&circuit), vec![a]);
        let mut tap_out = TapOut::new(Arc::clone(&circuit), vec![b]);
        assert!(tap_in.start());
        assert!(tap_out.start());

        let samples = [0.5f32, 0.25, -0.25, 1.0, 0.0];
        let bytes = encode(&samples);
        let mut input = AudioInput::new(bytes.as_slice());
        let mut output = AudioOutput::new(Vec::new());

        let written = stream_audio(&mut input, &mut output, &mut tap_in, &mut tap_out, 2).unwrap();
        assert_eq!(written, samples.len());

        let out = decode(&output.into_inner());
        assert_eq!(out.len(), samples.len());
        // one frame of latency through the wire
        for (got, want) in out[1..].iter().zip(&samples[..4]) {
            assert!((got - want).abs() < 1e-3, "{got} != {want}");
        }
    }
}

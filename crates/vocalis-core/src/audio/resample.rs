//! Sample-rate conversion using rubato's FFT resampler
//!
//! Band-limited frequency-domain resampling. Invoked only at save time, so
//! every enhancement stage upstream operates at the source rate.

use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::audio::SampleBuffer;
use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Convert `buffer` to `target_rate`.
///
/// No-op when the rates already match. The output length is
/// `round(len * target_rate / source_rate)`: the resampler's startup delay
/// is trimmed and the tail is flushed with silence so the result lines up
/// with the input to within a sample.
pub fn resample(buffer: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer> {
    if buffer.sample_rate == target_rate {
        return Ok(buffer.clone());
    }
    if buffer.is_empty() {
        return Ok(SampleBuffer::new(Vec::new(), target_rate));
    }

    let source_rate = buffer.sample_rate;
    let expected =
        (buffer.len() as f64 * target_rate as f64 / source_rate as f64).round() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1,
    )
    .map_err(|e| Error::ResampleError(e.to_string()))?;

    let delay = resampler.output_delay();
    let mut output: Vec<f32> = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut chunk = vec![0.0f32; CHUNK_SIZE];

    let feed =
        |resampler: &mut FftFixedIn<f32>, chunk: &Vec<f32>, output: &mut Vec<f32>| -> Result<()> {
            let frames = resampler
                .process(std::slice::from_ref(chunk), None)
                .map_err(|e| Error::ResampleError(e.to_string()))?;
            output.extend_from_slice(&frames[0]);
            Ok(())
        };

    for input in buffer.samples.chunks(CHUNK_SIZE) {
        if input.len() == CHUNK_SIZE {
            chunk.copy_from_slice(input);
        } else {
            chunk[..input.len()].copy_from_slice(input);
            chunk[input.len()..].fill(0.0);
        }
        feed(&mut resampler, &chunk, &mut output)?;
    }

    // Flush: the FFT resampler holds `delay` frames of latency; push silence
    // until the delayed tail of the real signal has come out.
    chunk.fill(0.0);
    let mut flushes = 0;
    while output.len() < expected + delay {
        feed(&mut resampler, &chunk, &mut output)?;
        flushes += 1;
        if flushes > 64 {
            return Err(Error::ResampleError(
                "resampler failed to flush expected output".to_string(),
            ));
        }
    }

    let start = delay.min(output.len());
    let mut samples = output.split_off(start);
    samples.resize(expected, 0.0);

    debug!(
        "Resampled {} frames at {} Hz to {} frames at {} Hz",
        buffer.len(),
        source_rate,
        samples.len(),
        target_rate
    );
    Ok(SampleBuffer::new(samples, target_rate))
}

//! Spectral noise suppression
//!
//! STFT spectral subtraction with a stationary noise model: the noise
//! magnitude spectrum is estimated from the whole signal (per-bin mean over
//! all frames) and subtracted scaled by the configured strength. A spectral
//! floor bounds the attenuation per bin to limit musical noise.

use rustfft::{num_complex::Complex, FftPlanner};
use tracing::debug;

use crate::audio::SampleBuffer;
use crate::config::NoiseReductionConfig;
use crate::refine::StageOutput;

const WINDOW_SIZE: usize = 1024;
const HOP_SIZE: usize = WINDOW_SIZE / 2;
/// Per-bin gain never drops below this fraction of the original magnitude
const SPECTRAL_FLOOR: f32 = 0.1;
const MAG_EPS: f32 = 1e-10;
const OLA_NORM_EPS: f32 = 1e-6;

/// Apply noise reduction to `buffer`.
///
/// Pass-through when disabled or when strength is zero. Any internal failure
/// (non-finite output on pathological input) degrades to the original buffer.
pub fn suppress(buffer: &SampleBuffer, config: &NoiseReductionConfig) -> StageOutput {
    if !config.enabled {
        return StageOutput::Bypassed(buffer.clone());
    }

    let strength = config.strength.clamp(0.0, 1.0);
    if strength <= 0.0 {
        return StageOutput::Processed(buffer.clone());
    }

    debug!("Applying noise reduction (strength: {strength})");
    match spectral_subtract(&buffer.samples, strength) {
        Ok(samples) => StageOutput::Processed(SampleBuffer::new(samples, buffer.sample_rate)),
        Err(reason) => StageOutput::Degraded {
            buffer: buffer.clone(),
            reason,
        },
    }
}

/// Square-root Hann window, used for both analysis and synthesis so the
/// 50%-overlap-add reconstruction sums to unity.
fn sqrt_hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let hann = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos());
            hann.sqrt()
        })
        .collect()
}

fn spectral_subtract(samples: &[f32], strength: f32) -> Result<Vec<f32>, String> {
    let len = samples.len();
    if len == 0 {
        return Ok(Vec::new());
    }
    let num_frames = len.div_ceil(HOP_SIZE);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(WINDOW_SIZE);
    let ifft = planner.plan_fft_inverse(WINDOW_SIZE);
    let window = sqrt_hann_window(WINDOW_SIZE);

    // Pass 1: analysis. Keep every frame's spectrum so the noise profile can
    // be estimated over the whole signal before any bin is touched.
    let mut spectra: Vec<Vec<Complex<f32>>> = Vec::with_capacity(num_frames);
    let mut noise_profile = vec![0.0f64; WINDOW_SIZE];

    for frame_idx in 0..num_frames {
        let start = frame_idx * HOP_SIZE;
        let mut frame = vec![Complex::new(0.0f32, 0.0); WINDOW_SIZE];
        for i in 0..WINDOW_SIZE {
            let sample = if start + i < len { samples[start + i] } else { 0.0 };
            frame[i] = Complex::new(sample * window[i], 0.0);
        }
        fft.process(&mut frame);
        for (bin, value) in frame.iter().enumerate() {
            noise_profile[bin] += value.norm() as f64;
        }
        spectra.push(frame);
    }

    let noise_profile: Vec<f32> = noise_profile
        .into_iter()
        .map(|sum| (sum / num_frames as f64) as f32)
        .collect();

    // Pass 2: subtraction and overlap-add synthesis.
    let padded_len = (num_frames - 1) * HOP_SIZE + WINDOW_SIZE;
    let mut output = vec![0.0f32; padded_len];
    let mut ola_norm = vec![0.0f32; padded_len];
    let fft_norm = 1.0 / WINDOW_SIZE as f32;

    for (frame_idx, mut frame) in spectra.into_iter().enumerate() {
        for (bin, value) in frame.iter_mut().enumerate() {
            let mag = value.norm();
            let gain = if mag > MAG_EPS {
                let clean = (mag - strength * noise_profile[bin]).max(SPECTRAL_FLOOR * mag);
                clean / mag
            } else {
                0.0
            };
            *value *= gain;
        }

        ifft.process(&mut frame);

        let start = frame_idx * HOP_SIZE;
        for i in 0..WINDOW_SIZE {
            output[start + i] += frame[i].re * fft_norm * window[i];
            ola_norm[start + i] += window[i] * window[i];
        }
    }

    let mut result: Vec<f32> = output
        .iter()
        .zip(ola_norm.iter())
        .take(len)
        .map(|(&y, &norm)| y / norm.max(OLA_NORM_EPS))
        .collect();
    result.truncate(len);

    if result.iter().any(|s| !s.is_finite()) {
        return Err("noise reduction produced non-finite samples".to_string());
    }
    Ok(result)
}

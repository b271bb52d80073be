//! RMS loudness normalization with clip protection

use tracing::debug;

use crate::audio::SampleBuffer;
use crate::config::NormalizationConfig;
use crate::refine::StageOutput;

/// Uniform rescale applied after gain whenever the peak would exceed this
pub const PEAK_CEILING: f32 = 0.95;

/// Rescale `buffer` so its RMS loudness matches `target_db`.
///
/// Silent input (RMS exactly zero) passes through untouched; amplifying it
/// is meaningless and the dB conversion would divide by zero. If the gained
/// peak exceeds [`PEAK_CEILING`], the whole buffer is scaled down uniformly
/// so the peak lands on the ceiling — no per-sample clipping.
pub fn normalize(buffer: &SampleBuffer, config: &NormalizationConfig) -> StageOutput {
    if !config.enabled {
        return StageOutput::Bypassed(buffer.clone());
    }

    let rms = buffer.rms();
    if rms == 0.0 {
        return StageOutput::Degraded {
            buffer: buffer.clone(),
            reason: "signal RMS is zero, skipping normalization".to_string(),
        };
    }

    let current_db = 20.0 * rms.log10();
    let gain_db = config.target_db - current_db;
    let gain = 10.0f32.powf(gain_db / 20.0);

    let mut samples: Vec<f32> = buffer.samples.iter().map(|&s| s * gain).collect();

    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if peak > PEAK_CEILING {
        let scale = PEAK_CEILING / peak;
        for sample in &mut samples {
            *sample *= scale;
        }
    }

    let out = SampleBuffer::new(samples, buffer.sample_rate);
    if !out.is_finite() {
        return StageOutput::Degraded {
            buffer: buffer.clone(),
            reason: "normalization produced non-finite samples".to_string(),
        };
    }

    debug!("Volume normalized (gain: {gain_db:.2} dB)");
    StageOutput::Processed(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn enabled(target_db: f32) -> NormalizationConfig {
        NormalizationConfig {
            enabled: true,
            target_db,
        }
    }

    fn sine(amplitude: f32, len: usize) -> SampleBuffer {
        let samples = (0..len)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 16000.0).sin() * amplitude)
            .collect();
        SampleBuffer::new(samples, 16000)
    }

    #[test]
    fn hits_target_rms_within_half_db() {
        let buffer = sine(0.05, 16000);
        let out = normalize(&buffer, &enabled(-18.0)).into_buffer();
        let out_db = 20.0 * out.rms().log10();
        assert!(
            (out_db + 18.0).abs() < 0.5,
            "normalized RMS was {out_db:.2} dB"
        );
    }

    #[test]
    fn attenuates_as_well_as_amplifies() {
        let buffer = sine(0.9, 16000);
        let out = normalize(&buffer, &enabled(-30.0)).into_buffer();
        let out_db = 20.0 * out.rms().log10();
        assert!((out_db + 30.0).abs() < 0.5);
    }

    #[test]
    fn peak_never_exceeds_ceiling() {
        // -1 dB RMS target would push a sine's peak well past full scale
        let buffer = sine(0.1, 16000);
        let out = normalize(&buffer, &enabled(-1.0)).into_buffer();
        assert!(out.peak() <= PEAK_CEILING + 1e-4);
    }

    #[test]
    fn clip_guard_scales_uniformly() {
        let buffer = SampleBuffer::new(vec![0.01, 0.02, 0.04], 16000);
        let out = normalize(&buffer, &enabled(0.0)).into_buffer();
        // shape preserved: ratios between samples unchanged
        assert!((out.samples[1] / out.samples[0] - 2.0).abs() < 1e-3);
        assert!((out.samples[2] / out.samples[0] - 4.0).abs() < 1e-3);
        assert!((out.peak() - PEAK_CEILING).abs() < 1e-4);
    }

    #[test]
    fn silence_passes_through_with_warning() {
        let buffer = SampleBuffer::new(vec![0.0; 44100], 44100);
        match normalize(&buffer, &enabled(-18.0)) {
            StageOutput::Degraded { buffer: out, .. } => assert_eq!(out, buffer),
            other => panic!("expected degraded pass-through, got {other:?}"),
        }
    }

    #[test]
    fn disabled_is_bypassed_unchanged() {
        let buffer = sine(0.3, 1600);
        let config = NormalizationConfig {
            enabled: false,
            target_db: -18.0,
        };
        match normalize(&buffer, &config) {
            StageOutput::Bypassed(out) => assert_eq!(out, buffer),
            other => panic!("expected bypass, got {other:?}"),
        }
    }
}

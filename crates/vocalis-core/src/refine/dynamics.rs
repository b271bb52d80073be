//! Voice enhancement: dynamic range compression
//!
//! A hard-knee downward compressor: identity below the threshold, gain
//! reduction by the configured ratio above it. The EQ-boost option is
//! recognized in configuration but performs no signal change.

use tracing::{debug, info};

use crate::audio::SampleBuffer;
use crate::config::EnhancementConfig;
use crate::refine::StageOutput;

pub const COMPRESSOR_THRESHOLD: f32 = 0.3;
pub const COMPRESSOR_RATIO: f32 = 3.0;

/// Apply voice enhancement to `buffer`.
///
/// Pass-through when both compression and EQ-boost are off.
pub fn enhance(buffer: &SampleBuffer, config: &EnhancementConfig) -> StageOutput {
    if !config.compression && !config.eq_boost {
        return StageOutput::Bypassed(buffer.clone());
    }

    let mut samples = buffer.samples.clone();

    if config.compression {
        debug!(
            "Applying compression (threshold: {COMPRESSOR_THRESHOLD}, ratio: {COMPRESSOR_RATIO})"
        );
        for sample in &mut samples {
            *sample = compress_sample(*sample, COMPRESSOR_THRESHOLD, COMPRESSOR_RATIO);
        }
    }

    if config.eq_boost {
        info!("EQ boost enabled but not implemented; signal unchanged");
    }

    let out = SampleBuffer::new(samples, buffer.sample_rate);
    if !out.is_finite() {
        return StageOutput::Degraded {
            buffer: buffer.clone(),
            reason: "enhancement produced non-finite samples".to_string(),
        };
    }
    StageOutput::Processed(out)
}

#[inline]
fn compress_sample(sample: f32, threshold: f32, ratio: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= threshold {
        sample
    } else {
        sample.signum() * (threshold + (magnitude - threshold) / ratio)
    }
}

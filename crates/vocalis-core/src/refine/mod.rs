//! Audio refinement pipeline
//!
//! Sequences noise suppression, loudness normalization and dynamic range
//! compression over a decoded waveform, then resamples and writes the
//! result as PCM WAV. Stages are best-effort: an internal stage failure
//! degrades to the stage's input instead of aborting the pipeline. Only
//! decode and encode failures are fatal.

pub mod denoise;
pub mod dynamics;
pub mod normalize;

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::audio::{self, SampleBuffer};
use crate::config::RefinementConfig;
use crate::error::Result;

/// Result of a single refinement stage.
///
/// A stage never propagates an error to the orchestrator: it either produces
/// a transformed buffer, passes its input through because configuration
/// disabled it, or degrades to its input with a reason that is logged and
/// then forgotten.
#[derive(Debug, Clone)]
pub enum StageOutput {
    /// Stage ran and transformed the buffer
    Processed(SampleBuffer),
    /// Stage disabled by configuration; input returned unchanged
    Bypassed(SampleBuffer),
    /// Stage failed internally; carries the untouched input
    Degraded { buffer: SampleBuffer, reason: String },
}

impl StageOutput {
    /// Unwrap the carried buffer, discarding the tag.
    pub fn into_buffer(self) -> SampleBuffer {
        match self {
            StageOutput::Processed(buffer)
            | StageOutput::Bypassed(buffer)
            | StageOutput::Degraded { buffer, .. } => buffer,
        }
    }
}

/// Wall-clock seconds spent in each stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageTimings {
    pub noise_suppression: f64,
    pub normalization: f64,
    pub enhancement: f64,
    pub encode: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefinementMetadata {
    pub input_duration: f64,
    pub output_duration: f64,
    pub sample_rate: u32,
    pub processing_time: f64,
    pub stage_timings: StageTimings,
    pub file_size: u64,
}

/// Outcome of one refinement run. `success == false` implies `error` is set
/// and `metadata` is absent; callers never see a panic or a raw `Err`.
#[derive(Debug, Clone, Serialize)]
pub struct RefinementReport {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub metadata: Option<RefinementMetadata>,
    pub error: Option<String>,
}

/// Orchestrates the refinement stages over one input file.
pub struct AudioRefiner {
    config: RefinementConfig,
}

impl AudioRefiner {
    pub fn new(config: RefinementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    /// Run the full pipeline: decode → suppress → normalize → enhance →
    /// resample+encode. Fatal failures are folded into the report.
    pub fn refine_file(&self, input: &Path, output: &Path) -> RefinementReport {
        let started = Instant::now();
        info!(
            "Starting refinement pipeline: {} -> {}",
            input.display(),
            output.display()
        );

        match self.run(input, output, started) {
            Ok(metadata) => {
                info!(
                    "Refinement pipeline completed in {:.2}s",
                    metadata.processing_time
                );
                RefinementReport {
                    success: true,
                    output_path: Some(output.to_path_buf()),
                    metadata: Some(metadata),
                    error: None,
                }
            }
            Err(e) => {
                let message = format!("Refinement pipeline failed: {e}");
                error!("{message}");
                RefinementReport {
                    success: false,
                    output_path: None,
                    metadata: None,
                    error: Some(message),
                }
            }
        }
    }

    /// Refine an already-decoded buffer, without the final encode step.
    /// Exposed so callers holding raw samples can reuse the stage sequence.
    pub fn refine_buffer(&self, buffer: SampleBuffer) -> (SampleBuffer, StageTimings) {
        let mut timings = StageTimings::default();

        let t = Instant::now();
        let buffer = absorb(
            "noise suppression",
            denoise::suppress(&buffer, &self.config.noise_reduction),
        );
        timings.noise_suppression = t.elapsed().as_secs_f64();

        let t = Instant::now();
        let buffer = absorb(
            "normalization",
            normalize::normalize(&buffer, &self.config.normalization),
        );
        timings.normalization = t.elapsed().as_secs_f64();

        let t = Instant::now();
        let buffer = absorb(
            "enhancement",
            dynamics::enhance(&buffer, &self.config.enhancement),
        );
        timings.enhancement = t.elapsed().as_secs_f64();

        (buffer, timings)
    }

    fn run(&self, input: &Path, output: &Path, started: Instant) -> Result<RefinementMetadata> {
        let decoded = audio::decode(input)?;
        let input_duration = decoded.duration();

        let (refined, mut timings) = self.refine_buffer(decoded);

        let t = Instant::now();
        let file_info = audio::encode_wav(
            &refined,
            output,
            self.config.output.sample_rate,
            self.config.output.bit_depth,
        )?;
        timings.encode = t.elapsed().as_secs_f64();

        Ok(RefinementMetadata {
            input_duration,
            output_duration: file_info.duration,
            sample_rate: file_info.sample_rate,
            processing_time: started.elapsed().as_secs_f64(),
            stage_timings: timings,
            file_size: file_info.size_bytes,
        })
    }
}

/// Log a stage outcome and carry its buffer forward. Degraded stages are
/// observable only here; they never reach the report's error field.
fn absorb(stage: &str, output: StageOutput) -> SampleBuffer {
    match output {
        StageOutput::Processed(buffer) => {
            debug!("{stage} completed");
            buffer
        }
        StageOutput::Bypassed(buffer) => {
            info!("{stage} disabled");
            buffer
        }
        StageOutput::Degraded { buffer, reason } => {
            warn!("{stage} failed: {reason}, using original audio");
            buffer
        }
    }
}

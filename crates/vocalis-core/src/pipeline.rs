//! End-to-end speech generation: text → raw synthesized audio → refined WAV
//!
//! The public entry points never return `Err` and never panic: every
//! failure, fatal or otherwise, is folded into a [`PipelineOutcome`] with
//! `success == false` and a descriptive error string.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use serde::Serialize;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::refine::AudioRefiner;
use crate::tts::SpeechSynthesizer;

pub const MIN_TEXT_LEN: usize = 1;
pub const MAX_TEXT_LEN: usize = 5000;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/vocalis.toml";

/// Validate and trim text before any network traffic happens.
pub fn validate_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.len() < MIN_TEXT_LEN {
        return Err(Error::InvalidText(format!(
            "text too short, minimum {MIN_TEXT_LEN} character required"
        )));
    }
    if text.len() > MAX_TEXT_LEN {
        return Err(Error::InvalidText(format!(
            "text too long, maximum {MAX_TEXT_LEN} characters allowed (got {})",
            text.len()
        )));
    }
    Ok(text.to_string())
}

/// Metadata for a successful pipeline run — the stable caller contract.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMetadata {
    pub text_length: usize,
    pub voice_id: String,
    pub generation_time: f64,
    pub refinement_time: f64,
    pub total_time: f64,
    pub raw_size_mb: f64,
    pub refined_size_mb: f64,
    pub duration: f64,
    pub sample_rate: u32,
}

/// Result record returned by every pipeline entry point.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub success: bool,
    pub raw_audio_path: Option<PathBuf>,
    pub refined_audio_path: Option<PathBuf>,
    pub metadata: Option<PipelineMetadata>,
    pub error: Option<String>,
}

impl PipelineOutcome {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            raw_audio_path: None,
            refined_audio_path: None,
            metadata: None,
            error: Some(message),
        }
    }
}

/// One-file-in/one-file-out speech generation pipeline.
///
/// Holds its configuration immutably; every invocation constructs its own
/// buffers and touches only its own output paths, so separate instances (or
/// separate calls) may run concurrently without coordination.
pub struct SpeechPipeline {
    config: AppConfig,
    synthesizer: SpeechSynthesizer,
    refiner: AudioRefiner,
}

impl SpeechPipeline {
    /// Build a pipeline with the API key taken from the environment.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let synthesizer = SpeechSynthesizer::from_env(&config.tts)?;
        Ok(Self::with_synthesizer(config, synthesizer))
    }

    /// Build a pipeline around an existing synthesizer (used by tests to
    /// point at a stub backend).
    pub fn with_synthesizer(config: AppConfig, synthesizer: SpeechSynthesizer) -> Self {
        let refiner = AudioRefiner::new(config.refinement.clone());
        Self {
            config,
            synthesizer,
            refiner,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Complete pipeline: text → raw audio file → refined audio file.
    pub fn generate(
        &self,
        text: &str,
        voice_id: Option<&str>,
        output_name: Option<&str>,
    ) -> PipelineOutcome {
        let started = Instant::now();
        match self.run(text, voice_id, output_name, started) {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("Pipeline failed: {e}");
                error!("{message}");
                PipelineOutcome::failure(message)
            }
        }
    }

    fn run(
        &self,
        text: &str,
        voice_id: Option<&str>,
        output_name: Option<&str>,
        started: Instant,
    ) -> Result<PipelineOutcome> {
        // Reject bad input before the first network call
        let text = validate_text(text)?;

        self.config.paths.ensure_directories()?;

        let name = output_name
            .map(str::to_string)
            .unwrap_or_else(default_output_name);
        let raw_path = self.config.paths.raw_audio.join(format!("{name}.mp3"));
        let refined_path = self
            .config
            .paths
            .refined_audio
            .join(format!("{name}.wav"));

        info!("Starting speech generation ({} chars)", text.len());

        let synthesis = self
            .synthesizer
            .synthesize_to_file(&text, voice_id, &raw_path)?;

        let report = self.refiner.refine_file(&raw_path, &refined_path);
        let metadata = match (report.success, report.metadata) {
            (true, Some(metadata)) => metadata,
            _ => {
                let message = report
                    .error
                    .unwrap_or_else(|| "audio refinement failed".to_string());
                error!("{message}");
                return Ok(PipelineOutcome::failure(message));
            }
        };

        let total_time = started.elapsed().as_secs_f64();
        info!("Speech generation completed in {total_time:.2}s");

        Ok(PipelineOutcome {
            success: true,
            raw_audio_path: Some(raw_path),
            refined_audio_path: Some(refined_path),
            metadata: Some(PipelineMetadata {
                text_length: text.len(),
                voice_id: synthesis.voice_id,
                generation_time: round2(synthesis.generation_time),
                refinement_time: round2(metadata.processing_time),
                total_time: round2(total_time),
                raw_size_mb: round2(synthesis.size_bytes as f64 / (1024.0 * 1024.0)),
                refined_size_mb: round2(metadata.file_size as f64 / (1024.0 * 1024.0)),
                duration: metadata.output_duration,
                sample_rate: metadata.sample_rate,
            }),
            error: None,
        })
    }
}

/// Generate with configuration loaded from `config_path`.
pub fn generate_refined_audio(
    text: &str,
    voice_id: Option<&str>,
    output_name: Option<&str>,
    config_path: &str,
) -> PipelineOutcome {
    let config = match AppConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => return PipelineOutcome::failure(format!("Pipeline failed: {e}")),
    };
    let pipeline = match SpeechPipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => return PipelineOutcome::failure(format!("Pipeline failed: {e}")),
    };
    pipeline.generate(text, voice_id, output_name)
}

/// Quick generation with default configuration location and voice.
pub fn quick_generate(text: &str) -> PipelineOutcome {
    generate_refined_audio(text, None, None, DEFAULT_CONFIG_PATH)
}

fn default_output_name() -> String {
    format!("speech_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_character() {
        assert_eq!(validate_text("a").unwrap(), "a");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(validate_text("  hello  \n").unwrap(), "hello");
    }

    #[test]
    fn rejects_empty_and_whitespace_only() {
        assert!(matches!(validate_text(""), Err(Error::InvalidText(_))));
        assert!(matches!(validate_text("   \n\t"), Err(Error::InvalidText(_))));
    }

    #[test]
    fn boundary_at_5000_characters() {
        let exactly = "x".repeat(MAX_TEXT_LEN);
        assert_eq!(validate_text(&exactly).unwrap().len(), MAX_TEXT_LEN);

        let over = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(validate_text(&over), Err(Error::InvalidText(_))));
    }

    #[test]
    fn length_checked_after_trim() {
        // 5000 non-space characters padded with whitespace still passes
        let padded = format!("  {}  ", "x".repeat(MAX_TEXT_LEN));
        assert!(validate_text(&padded).is_ok());
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round2(1.2345), 1.23);
        assert_eq!(round2(1.239), 1.24);
    }
}

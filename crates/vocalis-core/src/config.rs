//! Configuration types for the Vocalis pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::tts::VoiceSettings;

/// Top-level application configuration.
///
/// The `tts` and `refinement` sections are required; a configuration file
/// that omits them (or any of their fields) fails to load. Paths and logging
/// fall back to sensible defaults relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub tts: TtsConfig,
    pub refinement: RefinementConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, with `VOCALIS_*` environment
    /// variables layered on top (e.g. `VOCALIS_REFINEMENT__OUTPUT__SAMPLE_RATE`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("VOCALIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the pipeline cannot honor before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.refinement.validate()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tts: TtsConfig::default(),
            refinement: RefinementConfig::default(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Settings for the ElevenLabs synthesis backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Model identifier, e.g. `eleven_multilingual_v2`
    pub model: String,

    /// Voice used when a request does not name one
    pub default_voice_id: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub settings: VoiceSettings,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: "eleven_multilingual_v2".to_string(),
            default_voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            base_url: default_base_url(),
            settings: VoiceSettings::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

/// Audio refinement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementConfig {
    pub noise_reduction: NoiseReductionConfig,
    pub normalization: NormalizationConfig,
    pub enhancement: EnhancementConfig,
    pub output: OutputConfig,
}

impl RefinementConfig {
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        if !(0.0..=1.0).contains(&self.noise_reduction.strength) {
            return Err(Error::ConfigError(format!(
                "noise_reduction.strength must be in [0, 1], got {}",
                self.noise_reduction.strength
            )));
        }
        Ok(())
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            noise_reduction: NoiseReductionConfig::default(),
            normalization: NormalizationConfig::default(),
            enhancement: EnhancementConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseReductionConfig {
    pub enabled: bool,
    /// Reduction strength in [0, 1]; 0 leaves the signal untouched
    pub strength: f32,
}

impl Default for NoiseReductionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub enabled: bool,
    /// Target RMS loudness in dBFS, typically negative
    pub target_db: f32,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_db: -18.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementConfig {
    pub compression: bool,
    /// Recognized but not implemented; enabling it changes nothing
    pub eq_boost: bool,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            compression: true,
            eq_boost: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Sample rate of the saved WAV (Hz)
    pub sample_rate: u32,
    /// Integer PCM bit depth: 16, 24 or 32
    pub bit_depth: u16,
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.bit_depth, 16 | 24 | 32) {
            return Err(Error::ConfigError(format!(
                "output.bit_depth must be 16, 24 or 32, got {}",
                self.bit_depth
            )));
        }
        if self.sample_rate == 0 {
            return Err(Error::ConfigError("output.sample_rate must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            bit_depth: 16,
        }
    }
}

/// Output and log directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_raw_audio_dir")]
    pub raw_audio: PathBuf,

    #[serde(default = "default_refined_audio_dir")]
    pub refined_audio: PathBuf,

    #[serde(default = "default_logs_dir")]
    pub logs: PathBuf,
}

impl PathsConfig {
    /// Create all configured directories if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.raw_audio, &self.refined_audio, &self.logs] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_audio: default_raw_audio_dir(),
            refined_audio: default_refined_audio_dir(),
            logs: default_logs_dir(),
        }
    }
}

fn default_raw_audio_dir() -> PathBuf {
    PathBuf::from("output/raw")
}

fn default_refined_audio_dir() -> PathBuf {
    PathBuf::from("output/refined")
}

fn default_logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocalis")
        .join("logs")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

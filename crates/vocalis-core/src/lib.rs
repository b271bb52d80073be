//! Vocalis Core - Text-to-speech refinement pipeline
//!
//! Converts input text into a refined speech WAV suitable for downstream
//! lip-sync video generation. One pipeline invocation is a single batch
//! pass: text → synthesized speech (ElevenLabs) → noise-reduced, loudness-
//! normalized, compressed, resampled PCM output.
//!
//! # Example
//!
//! ```ignore
//! use vocalis_core::{AppConfig, SpeechPipeline};
//!
//! let config = AppConfig::load("config/vocalis.toml")?;
//! let pipeline = SpeechPipeline::new(config)?;
//!
//! let outcome = pipeline.generate("Hello, world!", None, None);
//! if outcome.success {
//!     println!("refined audio: {:?}", outcome.refined_audio_path);
//! }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod refine;
pub mod tts;

pub use audio::{FileInfo, SampleBuffer};
pub use config::{
    AppConfig, EnhancementConfig, NoiseReductionConfig, NormalizationConfig, OutputConfig,
    PathsConfig, RefinementConfig, TtsConfig,
};
pub use error::{Error, Result};
pub use pipeline::{
    generate_refined_audio, quick_generate, validate_text, PipelineMetadata, PipelineOutcome,
    SpeechPipeline,
};
pub use refine::{AudioRefiner, RefinementReport, StageOutput};
pub use tts::{SpeechSynthesizer, Voice, VoiceSettings};

//! ElevenLabs text-to-speech client
//!
//! A thin blocking HTTP wrapper: text plus voice parameters in, encoded
//! audio bytes out. One attempt per request, no retries; a non-success
//! status is surfaced with the response body attached.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TtsConfig;
use crate::error::{Error, Result};

pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Voice rendering parameters forwarded verbatim to the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default = "default_style")]
    pub style: f32,
    #[serde(default = "default_speaker_boost")]
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: default_style(),
            use_speaker_boost: default_speaker_boost(),
        }
    }
}

fn default_stability() -> f32 {
    0.6
}

fn default_similarity_boost() -> f32 {
    0.8
}

fn default_style() -> f32 {
    0.4
}

fn default_speaker_boost() -> bool {
    true
}

/// One entry from the voice catalog
#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    #[serde(rename = "voice_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    voices: Vec<Voice>,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: &'a VoiceSettings,
}

/// Raw synthesis output plus timing
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub audio: Vec<u8>,
    pub voice_id: String,
    /// Wall-clock seconds spent on the request
    pub generation_time: f64,
}

/// Synthesis written to disk
#[derive(Debug, Clone)]
pub struct SynthesisFile {
    pub path: std::path::PathBuf,
    pub size_bytes: u64,
    pub voice_id: String,
    pub generation_time: f64,
}

/// Blocking client for the ElevenLabs REST API
pub struct SpeechSynthesizer {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    default_voice_id: String,
    settings: VoiceSettings,
}

impl SpeechSynthesizer {
    pub fn new(api_key: impl Into<String>, config: &TtsConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            default_voice_id: config.default_voice_id.clone(),
            settings: config.settings.clone(),
        }
    }

    /// Build a client with the API key from `ELEVENLABS_API_KEY`.
    pub fn from_env(config: &TtsConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| Error::MissingApiKey)?;
        if api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }
        Ok(Self::new(api_key, config))
    }

    /// Check the key by fetching the voice catalog; returns the voice count.
    pub fn validate_api_key(&self) -> Result<usize> {
        let voices = self.voices()?;
        info!("API key validated, {} voices available", voices.len());
        Ok(voices.len())
    }

    /// Fetch the available voices.
    pub fn voices(&self) -> Result<Vec<Voice>> {
        let url = format!("{}/v1/voices", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("xi-api-key", &self.api_key)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::TtsError(format!(
                "voice listing failed ({status}): {body}"
            )));
        }

        let parsed: VoicesResponse = response.json()?;
        Ok(parsed.voices)
    }

    /// Convert `text` to speech. Uses the configured default voice unless
    /// `voice_id` overrides it.
    pub fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Synthesis> {
        let voice_id = voice_id.unwrap_or(&self.default_voice_id);
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);

        info!(
            "Generating audio for text ({} chars) with voice {}",
            text.len(),
            voice_id
        );
        let started = Instant::now();

        let request = SynthesisRequest {
            text,
            model_id: &self.model,
            voice_settings: &self.settings,
        };

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::TtsError(format!(
                "synthesis failed ({status}): {body}"
            )));
        }

        let audio = response.bytes()?.to_vec();
        let generation_time = started.elapsed().as_secs_f64();
        debug!(
            "Received {} bytes of audio in {:.2}s",
            audio.len(),
            generation_time
        );

        Ok(Synthesis {
            audio,
            voice_id: voice_id.to_string(),
            generation_time,
        })
    }

    /// Synthesize and write the raw bytes to `path`, creating intermediate
    /// directories.
    pub fn synthesize_to_file(
        &self,
        text: &str,
        voice_id: Option<&str>,
        path: &Path,
    ) -> Result<SynthesisFile> {
        let synthesis = self.synthesize(text, voice_id)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, &synthesis.audio)?;

        let size_bytes = fs::metadata(path)?.len();
        info!(
            "Audio saved to {} ({:.2} MB)",
            path.display(),
            size_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(SynthesisFile {
            path: path.to_path_buf(),
            size_bytes,
            voice_id: synthesis.voice_id,
            generation_time: synthesis.generation_time,
        })
    }
}

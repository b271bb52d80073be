//! Error types for the Vocalis pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid text input: {0}")]
    InvalidText(String),

    #[error("ELEVENLABS_API_KEY not found in environment")]
    MissingApiKey,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Speech synthesis failed: {0}")]
    TtsError(String),

    #[error("Audio decode error: {0}")]
    DecodeError(String),

    #[error("Audio encode error: {0}")]
    EncodeError(String),

    #[error("Resampling error: {0}")]
    ResampleError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::EncodeError(e.to_string())
    }
}

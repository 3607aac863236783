//! Error types for Hent.

use thiserror::Error;

/// Library-level error type for Hent operations.
#[derive(Error, Debug)]
pub enum HentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A download is already in progress")]
    AlreadyRunning,

    #[error("{0}")]
    DurationExceeded(String),

    #[error("Media extraction failed: {0}")]
    Extraction(String),

    #[error("Tag embedding failed: {0}")]
    Tagging(String),

    #[error("Chat provider error: {0}")]
    Chat(String),

    #[error("Speech synthesis failed: {0}")]
    Tts(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

/// Result type alias for Hent operations.
pub type Result<T> = std::result::Result<T, HentError>;

//! Error types for railvox.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio output errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio output failed: {message}")]
    AudioOutput { message: String },

    // Clip loading errors
    #[error("Fetch failed for {path}: {message}")]
    Fetch { path: String, message: String },

    #[error("Decode failed: {message}")]
    Decode { message: String },

    // Phrase input errors
    #[error("Invalid phrase document: {0}")]
    Phrase(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxError>;

//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected <number><unit> with units h, m, s or ms (e.g., 12s, 1m, 1m30s, 500ms)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when parsing a canvas size
#[derive(Debug, Clone, Error)]
#[error("Invalid canvas size: \"{input}\". {reason}")]
pub struct CanvasParseError {
    pub input: String,
    pub reason: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

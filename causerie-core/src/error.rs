//! Error types for causerie-core

use thiserror::Error;

/// Main error type for the causerie-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Parse error for a stored file
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Upstream agent API error
    #[error("agent error: {0}")]
    Agent(String),
}

/// Result type alias for causerie-core
pub type Result<T> = std::result::Result<T, Error>;

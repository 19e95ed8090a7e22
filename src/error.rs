//! Error types for configuration and persistence
//!
//! Gameplay itself never fails; only loading and saving files does.

/// Error type for tuning and high score I/O
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tuning values that would break the simulation
    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),
}

/// Result type for crate I/O operations
pub type Result<T> = std::result::Result<T, Error>;

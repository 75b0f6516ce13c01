//! Error types for Hearth core library.

use thiserror::Error;

/// Result type alias using Hearth Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Hearth operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A platform directory could not be determined
    #[error("Could not determine {0} directory")]
    NoPlatformDir(&'static str),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

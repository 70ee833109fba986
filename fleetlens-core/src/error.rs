//! Error types for fleetlens-core

use thiserror::Error;

/// Main error type for the fleetlens-core library
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

    /// Aggregation pass failure
    #[error("aggregation error: {0}")]
    Aggregate(String),
}

/// Result type alias for fleetlens-core
pub type Result<T> = std::result::Result<T, Error>;

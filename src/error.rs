//! Hearthboard error types

use thiserror::Error;

/// Hearthboard error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Artifact store error
    #[error("Store error: {0}")]
    Store(String),

    /// Version-control history error
    #[error("History error: {0}")]
    History(String),

    /// Bridge (local API) error
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Hearthboard operations
pub type Result<T> = std::result::Result<T, Error>;

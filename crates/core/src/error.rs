//! Error types for the order-block detector.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the order-block detector.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error, raised before any bar is processed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input contract violated (out-of-order bars, broken segment invariant).
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Data error (invalid or malformed bar data).
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a precondition error.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }
}

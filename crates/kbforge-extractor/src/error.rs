//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Request references items or collections that do not exist
    #[error("Validation error: {0}")]
    Validation(String),

    /// Content store error
    #[error("Store error: {0}")]
    Store(String),

    /// Model capability error (tokenize or generate)
    #[error("Model error: {0}")]
    Model(String),

    /// Stored artifact could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Graph could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Extraction deadline exceeded
    #[error("Extraction deadline exceeded")]
    Timeout,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::Serialization(e.to_string())
    }
}

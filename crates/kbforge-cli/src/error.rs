//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error(transparent)]
    Store(#[from] kbforge_store::StoreError),

    /// Model error
    #[error(transparent)]
    Model(#[from] kbforge_model::ModelError),

    /// Job orchestration error
    #[error(transparent)]
    Worker(#[from] kbforge_worker::WorkerError),

    /// Extraction error
    #[error(transparent)]
    Extractor(#[from] kbforge_extractor::ExtractorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Job not found
    #[error("Job not found: {0}")]
    NotFound(String),
}

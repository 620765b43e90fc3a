//! Error types for Worker operations

use kbforge_extractor::ExtractorError;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur while accepting or running jobs
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Request references items or collections that do not exist
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Model could not be loaded
    #[error("Model unavailable: {0}")]
    Model(String),

    /// Extraction failed (model call, parse or serialization)
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Job exceeded its wall-clock deadline
    #[error("Job timed out after {0}s")]
    Timeout(u64),

    /// Job does not exist
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Requested lifecycle transition is not allowed
    #[error("Invalid job transition: {0}")]
    InvalidTransition(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues, poisoned locks)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<ExtractorError> for WorkerError {
    fn from(e: ExtractorError) -> Self {
        match e {
            ExtractorError::Validation(msg) => WorkerError::Validation(msg),
            ExtractorError::Store(msg) => WorkerError::Store(msg),
            ExtractorError::Config(msg) => WorkerError::Config(msg),
            other => WorkerError::Extraction(other.to_string()),
        }
    }
}

/// Map any store error into `WorkerError::Store`
pub(crate) fn store_err<E: Display>(e: E) -> WorkerError {
    WorkerError::Store(e.to_string())
}

/// Lock a shared value, surfacing poisoning as an error
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, WorkerError> {
    mutex
        .lock()
        .map_err(|e| WorkerError::Worker(format!("Lock poisoned: {}", e)))
}

//! Error types for pipeline runs

use regula_domain::ServiceError;
use regula_gatekeeper::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a single task
///
/// Never aborts the run: the executor turns it into a failed result.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Local preparation failed before any external call
    #[error("Preparation failed: {0}")]
    Prepare(String),

    /// Non-retryable service failure
    #[error("Service error: {0}")]
    Service(ServiceError),

    /// Every allowed attempt failed
    #[error("Failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Calls made
        attempts: u32,
        /// Error of the final call
        last: ServiceError,
    },

    /// Response rejected by the Gatekeeper
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Output could not be written
    #[error("Failed to write {}: {message}", path.display())]
    Persist {
        /// Destination path
        path: PathBuf,
        /// I/O error
        message: String,
    },
}

/// Errors that prevent a run from starting
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

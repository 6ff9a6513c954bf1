//! Error types for the Extractor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering or preparing work
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// A directory or entry could not be read
    #[error("Cannot read {}: {message}", path.display())]
    Discovery {
        /// Offending path
        path: PathBuf,
        /// I/O error
        message: String,
    },

    /// Case-number pattern does not compile or lacks a capture group
    #[error("Invalid case pattern: {0}")]
    InvalidPattern(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    pub(crate) fn discovery(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        ExtractorError::Discovery {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

//! Gatekeeper error types

use crate::validator::Violation;
use thiserror::Error;

/// Reasons a completion response is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Response is not JSON after fence stripping
    #[error("Invalid JSON: {message}\nResponse: {preview}")]
    InvalidJson {
        /// Parser error
        message: String,
        /// Leading characters of the offending text
        preview: String,
    },

    /// JSON parsed but violates the record constraints
    #[error("Schema violation: {}", summarize(.0))]
    Schema(Vec<Violation>),
}

impl ValidationError {
    /// Violations behind a schema failure (empty for invalid JSON)
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationError::Schema(violations) => violations,
            ValidationError::InvalidJson { .. } => &[],
        }
    }
}

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (+{} more)", first, rest.len()),
    }
}

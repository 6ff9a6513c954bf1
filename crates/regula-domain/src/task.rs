//! Task module - one discovered unit of pending work

use std::path::PathBuf;

/// A unit of work produced by discovery and consumed once by the pipeline.
///
/// `source` is either a single document (OCR stage) or a case folder holding
/// several documents (rules stage). `destination` never exists at the moment
/// a task is created; discovery skips anything already done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Human-readable identifier (document file name or case number)
    pub id: String,

    /// Source document or source folder
    pub source: PathBuf,

    /// Output file written on success
    pub destination: PathBuf,
}

impl Task {
    /// Create a new task
    pub fn new(id: impl Into<String>, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            destination: destination.into(),
        }
    }
}

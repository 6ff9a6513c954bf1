//! Regula Domain Layer
//!
//! Core data model shared by every stage of the accident-rule pipeline.
//! Infrastructure (HTTP clients, filesystem walking, persistence) lives in
//! other crates; this crate only defines the concepts and the trait seams
//! they plug into.
//!
//! ## Key Concepts
//!
//! - **Task**: one discovered unit of pending work (a document or a case folder)
//! - **Document Bundle**: the known document roles located (or missing) for a case
//! - **ExtractionResult**: the single outcome reported for every task
//! - **StructuredRecord**: the validated expert-rule record derived for one case
//! - **ServiceError**: remote failures tagged with a retry-relevant [`ErrorKind`]
//!
//! ## Architecture
//!
//! - Pure data types plus serde derives for the persisted record format
//! - Trait definitions for the two external services
//! - No I/O

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundle;
pub mod error;
pub mod outcome;
pub mod record;
pub mod task;
pub mod traits;

// Re-exports for convenience
pub use bundle::{DocumentBundle, DocumentRole};
pub use error::{ErrorKind, ServiceError};
pub use outcome::{ExtractionResult, TaskStatus};
pub use record::{
    BotConclusions, Decision, DecisionStatus, EventMeta, ExpertRule, ProblemCategory, RiskLevel,
    StructuredRecord,
};
pub use task::Task;

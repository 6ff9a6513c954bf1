//! Regula Storage Layer
//!
//! Merges the per-case record files into one rule database.
//!
//! # Architecture
//!
//! - One pretty-printed JSON file per case, `<prefix><n>.json`
//! - Every file re-checked by the Gatekeeper before it is merged
//! - One database file with `_metadata` (version, count, exclusions,
//!   statistics) and the tagged records, written atomically
//!
//! # Examples
//!
//! ```no_run
//! use regula_store::aggregate;
//! use std::collections::BTreeSet;
//! use std::path::Path;
//!
//! let excluded = BTreeSet::from([5, 23]);
//! let report = aggregate(Path::new("./reguly"), Path::new("./rules_database.json"), &excluded)?;
//! println!("Loaded {} records", report.loaded.len());
//! # Ok::<(), regula_store::StoreError>(())
//! ```

#![warn(missing_docs)]

mod aggregate;
mod database;

use std::path::PathBuf;
use thiserror::Error;

pub use aggregate::{aggregate, AggregateReport, Aggregator, LoadFailure};
pub use database::{DatabaseMetadata, DatabaseStatistics, RuleDatabase, TaggedRecord, DATABASE_VERSION};

/// Errors that end an aggregation
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record could be loaded; nothing was written
    #[error("No records found to merge")]
    NoRecords,

    /// Folder or output file I/O failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Database could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

//! Regula Extractor
//!
//! The two extraction stages built on top of the pipeline.
//!
//! # Overview
//!
//! ```text
//! scans/<case>/*.pdf  → OcrJob  → text/<case>/*.txt
//! text/<case>/*.txt   → RuleJob → rules/regula_wypadek_<n>.json
//! ```
//!
//! This crate owns what is stage specific:
//!
//! - **Discovery**: pending work for each stage, skipping completed outputs
//! - **Bundles**: locating a case's documents by role and reading them
//! - **Prompts**: the rule-derivation prompt
//! - **Jobs**: [`OcrJob`] and [`RuleJob`], run by `regula_pipeline::Pipeline`
//! - **Configuration**: per-stage settings with TOML helpers
//!
//! # Example Usage
//!
//! ```no_run
//! use regula_extractor::{discover_cases, RuleJob, RuleStageConfig};
//! use regula_gatekeeper::Gatekeeper;
//! use regula_llm::MockProvider;
//! use regula_pipeline::{Pipeline, TracingSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RuleStageConfig::default();
//! let found = discover_cases(
//!     &config.input_root,
//!     &config.output_root,
//!     &config.compiled_pattern()?,
//!     &config.file_prefix,
//!     config.limit,
//! )?;
//!
//! let job = RuleJob::new(MockProvider::new("{}"), Gatekeeper::default());
//! let pipeline = Pipeline::new(job, config.pipeline.clone())?;
//! let summary = pipeline.run(found.tasks, found.skipped, &mut TracingSink).await;
//! println!("{}", summary.counters.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod bundle;
mod config;
mod discovery;
mod error;
mod ocr;
mod prompt;
mod rules;


pub use bundle::{load_bundle, LoadedBundle, MISSING_PLACEHOLDER};
pub use config::{OcrStageConfig, RuleStageConfig, DEFAULT_CASE_PATTERN, DEFAULT_FILE_PREFIX};
pub use discovery::{case_number, discover_cases, discover_documents, Discovery};
pub use error::ExtractorError;
pub use ocr::OcrJob;
pub use prompt::PromptBuilder;
pub use rules::{RuleJob, RuleRequest};

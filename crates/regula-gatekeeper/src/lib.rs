//! Regula Gatekeeper
//!
//! Turns raw completion output into a validated [`StructuredRecord`].
//!
//! The Gatekeeper provides:
//! - Code fence stripping
//! - JSON parsing with a preview of unparseable responses
//! - Constraint checks reporting every violation, in document order
//! - Meta normalization of accepted records
//!
//! Nothing is auto-corrected: a value outside a closed enumeration rejects
//! the whole record.
//!
//! # Examples
//!
//! ```
//! use regula_gatekeeper::{Gatekeeper, ValidationConfig};
//!
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//! let err = gatekeeper.parse("```json\n{\"meta\": {}}\n```").unwrap_err();
//! assert!(err.to_string().contains("meta.event_date"));
//! ```
//!
//! [`StructuredRecord`]: regula_domain::StructuredRecord

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::ValidationError;
pub use validator::{strip_code_fences, Gatekeeper, ValidationReport, Violation};

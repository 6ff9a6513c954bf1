//! Configuration for pipeline runs
//!
//! Worker count, retry budget and pacing for one stage.

use crate::PipelineError;
use regula_domain::ErrorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one pipeline run
///
/// # Examples
///
/// ```
/// use regula_pipeline::PipelineConfig;
///
/// // Documents: parallel, unpaced
/// let config = PipelineConfig::ocr();
/// assert_eq!(config.concurrency, 3);
///
/// // Cases: one worker, five seconds between cases
/// let config = PipelineConfig::rules();
/// assert_eq!(config.request_delay_ms, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of workers
    pub concurrency: usize,

    /// Total external calls allowed per task, first call included
    pub max_attempts: u32,

    /// Base backoff after a rate-limit error, multiplied by the attempt number
    pub rate_limit_backoff_ms: u64,

    /// Fixed backoff after a transient error
    pub transient_backoff_ms: u64,

    /// Pause before each task's first call (single worker), or the spacing
    /// of the shared limiter when `requests_per_minute` is unset
    pub request_delay_ms: u64,

    /// Shared quota across all workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_attempts: 3,
            rate_limit_backoff_ms: 30_000,
            transient_backoff_ms: 5_000,
            request_delay_ms: 0,
            requests_per_minute: None,
        }
    }
}

/// Pipeline keys read from a partial table, applied over a stage preset
///
/// A stage table that sets only `max_attempts` keeps the rest of its
/// preset, including the per-task delay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineOverrides {
    /// See [`PipelineConfig::concurrency`]
    pub concurrency: Option<usize>,
    /// See [`PipelineConfig::max_attempts`]
    pub max_attempts: Option<u32>,
    /// See [`PipelineConfig::rate_limit_backoff_ms`]
    pub rate_limit_backoff_ms: Option<u64>,
    /// See [`PipelineConfig::transient_backoff_ms`]
    pub transient_backoff_ms: Option<u64>,
    /// See [`PipelineConfig::request_delay_ms`]
    pub request_delay_ms: Option<u64>,
    /// See [`PipelineConfig::requests_per_minute`]
    pub requests_per_minute: Option<u32>,
}

impl PipelineOverrides {
    /// Apply the keys that were set onto `base`
    pub fn over(self, base: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            concurrency: self.concurrency.unwrap_or(base.concurrency),
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            rate_limit_backoff_ms: self.rate_limit_backoff_ms.unwrap_or(base.rate_limit_backoff_ms),
            transient_backoff_ms: self.transient_backoff_ms.unwrap_or(base.transient_backoff_ms),
            request_delay_ms: self.request_delay_ms.unwrap_or(base.request_delay_ms),
            requests_per_minute: self.requests_per_minute.or(base.requests_per_minute),
        }
    }
}

impl PipelineConfig {
    /// Document transcription preset
    pub fn ocr() -> Self {
        Self {
            concurrency: 3,
            ..Self::default()
        }
    }

    /// Rule derivation preset (free-tier quota friendly)
    pub fn rules() -> Self {
        Self {
            concurrency: 1,
            request_delay_ms: 5_000,
            ..Self::default()
        }
    }

    /// Check the configuration for values that cannot run
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.concurrency == 0 {
            return Err(PipelineError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(PipelineError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.requests_per_minute == Some(0) {
            return Err(PipelineError::Config(
                "requests_per_minute must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Pause before each task's first call
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Retry settings of this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            rate_limit_backoff: Duration::from_millis(self.rate_limit_backoff_ms),
            transient_backoff: Duration::from_millis(self.transient_backoff_ms),
        }
    }
}

/// How failed calls are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed
    pub max_attempts: u32,

    /// Base rate-limit backoff
    pub rate_limit_backoff: Duration,

    /// Transient backoff
    pub transient_backoff: Duration,
}

impl RetryPolicy {
    /// Sleep before the next call, after `attempt` (1-based) failed with `kind`
    ///
    /// `None` means no further call: the error is permanent or the budget
    /// is spent.
    pub fn backoff_for(&self, kind: ErrorKind, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        match kind {
            ErrorKind::RateLimited => Some(self.rate_limit_backoff.saturating_mul(attempt)),
            ErrorKind::Transient => Some(self.transient_backoff),
            ErrorKind::Permanent => None,
        }
    }
}

//! Progress reporting

use crate::Counters;
use regula_domain::ExtractionResult;
use tracing::{info, warn};

const ERROR_PREVIEW_CHARS: usize = 100;

/// Receives every task outcome as the accounting loop records it
pub trait ProgressSink: Send {
    /// Called once per task, after the counters were updated
    fn on_result(&mut self, result: &ExtractionResult, counters: &Counters, total: usize);
}

/// Logs one line per completed task
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_result(&mut self, result: &ExtractionResult, counters: &Counters, total: usize) {
        match &result.error {
            None => info!(
                task_id = %result.task_id,
                attempts = result.attempts,
                "✓ [{}/{}] {}",
                counters.processed,
                total,
                result.task_id
            ),
            Some(error) => {
                let preview: String = error.chars().take(ERROR_PREVIEW_CHARS).collect();
                warn!(
                    task_id = %result.task_id,
                    attempts = result.attempts,
                    "✗ {}: {}",
                    result.task_id,
                    preview
                );
            }
        }
    }
}

/// Keeps every outcome in arrival order
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    /// Outcomes received so far
    pub results: Vec<ExtractionResult>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for CollectingSink {
    fn on_result(&mut self, result: &ExtractionResult, _counters: &Counters, _total: usize) {
        self.results.push(result.clone());
    }
}

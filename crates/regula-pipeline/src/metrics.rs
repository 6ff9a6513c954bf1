//! Progress accounting for a run

use regula_domain::ExtractionResult;

/// Counters for one run
///
/// Owned by the accounting loop; workers never touch them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Tasks whose output was written
    pub processed: usize,

    /// Work units skipped during discovery
    pub skipped: usize,

    /// Tasks that failed
    pub errors: usize,
}

impl Counters {
    /// Counters seeded with the discovery skip count
    pub fn new(skipped: usize) -> Self {
        Self {
            skipped,
            ..Self::default()
        }
    }

    /// Record one task outcome
    pub fn record(&mut self, result: &ExtractionResult) {
        if result.is_success() {
            self.processed += 1;
        } else {
            self.errors += 1;
        }
    }

    /// Tasks that reached a final outcome
    pub fn completed(&self) -> usize {
        self.processed + self.errors
    }

    /// Every work unit accounted for, skipped ones included
    pub fn total(&self) -> usize {
        self.completed() + self.skipped
    }

    /// Generate a summary report of the counters
    pub fn summary(&self) -> String {
        [
            format!("Processed: {}", self.processed),
            format!("Skipped:   {}", self.skipped),
            format!("Errors:    {}", self.errors),
        ]
        .join("\n")
    }
}

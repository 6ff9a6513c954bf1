//! Per-task outcome reported by the pipeline

/// Final status of one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Output written to the destination
    Success,

    /// No output written; see the error description
    Failure,
}

/// Outcome of one task, produced exactly once per dispatched task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Identifier of the task this result belongs to
    pub task_id: String,

    /// Success or failure
    pub status: TaskStatus,

    /// Error description, present only on failure
    pub error: Option<String>,

    /// Number of external calls made for the task
    pub attempts: u32,
}

impl ExtractionResult {
    /// Successful outcome
    pub fn success(task_id: impl Into<String>, attempts: u32) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Success,
            error: None,
            attempts,
        }
    }

    /// Failed outcome with its last error
    pub fn failure(task_id: impl Into<String>, error: impl Into<String>, attempts: u32) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failure,
            error: Some(error.into()),
            attempts,
        }
    }

    /// Whether the task succeeded
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        let result = ExtractionResult::success("a.pdf", 1);
        assert!(result.is_success());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_failure_keeps_error() {
        let result = ExtractionResult::failure("7", "quota exceeded", 3);
        assert_eq!(result.status, TaskStatus::Failure);
        assert_eq!(result.error.as_deref(), Some("quota exceeded"));
        assert_eq!(result.attempts, 3);
    }
}

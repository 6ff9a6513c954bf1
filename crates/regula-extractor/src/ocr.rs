//! Transcription stage job

use async_trait::async_trait;
use regula_domain::traits::DocumentService;
use regula_domain::{ServiceError, Task};
use regula_llm::DocumentTextClient;
use regula_pipeline::{Job, TaskError};

/// Transcribes one scanned document per task
///
/// The external call covers the whole upload, poll, fetch and release
/// sequence, so a retry starts from a fresh upload.
pub struct OcrJob<S> {
    client: DocumentTextClient<S>,
}

impl<S: DocumentService> OcrJob<S> {
    /// Create a job over a document client
    pub fn new(client: DocumentTextClient<S>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<S: DocumentService + 'static> Job for OcrJob<S> {
    type Request = ();

    async fn prepare(&self, task: &Task) -> Result<(), TaskError> {
        if !task.source.is_file() {
            return Err(TaskError::Prepare(format!(
                "{} is not a readable file",
                task.source.display()
            )));
        }
        Ok(())
    }

    async fn call(&self, task: &Task, _request: &()) -> Result<String, ServiceError> {
        self.client.extract_text(&task.source).await
    }

    async fn finish(&self, _task: &Task, _request: &(), raw: String) -> Result<String, TaskError> {
        Ok(raw)
    }
}

//! The unit of work a pipeline runs for each task

use crate::TaskError;
use async_trait::async_trait;
use regula_domain::{ServiceError, Task};

/// One stage's work, split by retry semantics
///
/// Only `call` is retried. `prepare` and `finish` are local and run once, so
/// a response that fails validation is never re-requested.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    /// Input built for the external call
    type Request: Send + Sync + 'static;

    /// Build the request from local inputs
    async fn prepare(&self, task: &Task) -> Result<Self::Request, TaskError>;

    /// Make the external call
    async fn call(&self, task: &Task, request: &Self::Request) -> Result<String, ServiceError>;

    /// Validate the raw response and render the content to persist
    async fn finish(
        &self,
        task: &Task,
        request: &Self::Request,
        raw: String,
    ) -> Result<String, TaskError>;
}

//! Rule derivation stage job

use crate::bundle::load_bundle;
use crate::prompt::PromptBuilder;
use async_trait::async_trait;
use regula_domain::traits::CompletionProvider;
use regula_domain::{ServiceError, Task};
use regula_gatekeeper::Gatekeeper;
use regula_pipeline::{Job, TaskError};
use tracing::debug;

/// Prompt prepared for one case
#[derive(Debug, Clone)]
pub struct RuleRequest {
    /// Full prompt text
    pub prompt: String,

    /// Roles without a document, recorded in the output
    pub missing: Vec<String>,
}

/// Derives one validated record per case folder
pub struct RuleJob<P> {
    provider: P,
    gatekeeper: Gatekeeper,
}

impl<P: CompletionProvider> RuleJob<P> {
    /// Create a job over a completion provider
    pub fn new(provider: P, gatekeeper: Gatekeeper) -> Self {
        Self {
            provider,
            gatekeeper,
        }
    }
}

#[async_trait]
impl<P: CompletionProvider + 'static> Job for RuleJob<P> {
    type Request = RuleRequest;

    async fn prepare(&self, task: &Task) -> Result<RuleRequest, TaskError> {
        let loaded = load_bundle(&task.source)
            .await
            .map_err(|e| TaskError::Prepare(e.to_string()))?;
        let missing = loaded.missing();
        if !missing.is_empty() {
            debug!(task_id = %task.id, missing = ?missing, "Case has missing documents");
        }

        Ok(RuleRequest {
            prompt: PromptBuilder::new(&loaded).build(),
            missing,
        })
    }

    async fn call(&self, _task: &Task, request: &RuleRequest) -> Result<String, ServiceError> {
        self.provider.complete(&request.prompt).await
    }

    async fn finish(
        &self,
        task: &Task,
        request: &RuleRequest,
        raw: String,
    ) -> Result<String, TaskError> {
        let record = self.gatekeeper.parse_with_missing(&raw, &request.missing)?;
        serde_json::to_string_pretty(&record).map_err(|e| TaskError::Persist {
            path: task.destination.clone(),
            message: e.to_string(),
        })
    }
}

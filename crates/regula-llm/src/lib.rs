//! Regula Service Layer
//!
//! Clients for the two external services the pipeline depends on.
//!
//! # Architecture
//!
//! This crate provides implementations of the `DocumentService` and
//! `CompletionProvider` traits from `regula-domain`, plus
//! [`DocumentTextClient`], which turns the low-level document protocol
//! (submit, poll, fetch, release) into a single `extract_text` call.
//!
//! # Providers
//!
//! - `GeminiClient`: Gemini Files API and `generateContent`
//! - `MockProvider`: Scripted completion responses for testing
//! - `MockDocumentService`: Scripted document processing for testing
//!
//! # Examples
//!
//! ```
//! use regula_llm::MockProvider;
//! use regula_domain::traits::CompletionProvider;
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("Hello from the model!");
//! let result = provider.complete("test prompt").await.unwrap();
//! assert_eq!(result, "Hello from the model!");
//! # });
//! ```

#![warn(missing_docs)]

pub mod document;
pub mod gemini;

use async_trait::async_trait;
use regula_domain::traits::{CompletionProvider, DocumentHandle, DocumentService, DocumentState};
use regula_domain::ServiceError;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use document::DocumentTextClient;
pub use gemini::{GeminiClient, GeminiConfig};

/// Errors raised while constructing a client
#[derive(Error, Debug)]
pub enum LlmError {
    /// API key environment variable is unset or empty
    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock completion provider for deterministic testing
///
/// Scripted outcomes are returned in order; once the script is exhausted
/// the default response is returned for every call.
///
/// # Examples
///
/// ```
/// use regula_llm::MockProvider;
/// use regula_domain::ServiceError;
/// use regula_domain::traits::CompletionProvider;
///
/// # tokio_test::block_on(async {
/// let provider = MockProvider::new("{}");
/// provider.push_error(ServiceError::rate_limited("429"));
///
/// assert!(provider.complete("p").await.is_err());
/// assert_eq!(provider.complete("p").await.unwrap(), "{}");
/// assert_eq!(provider.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    script: Arc<Mutex<VecDeque<Result<String, ServiceError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response for the next unscripted call
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.script).push_back(Ok(response.into()));
    }

    /// Queue an error for the next unscripted call
    pub fn push_error(&self, error: ServiceError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Queue `count` copies of an error
    pub fn push_errors(&self, error: ServiceError, count: usize) {
        let mut script = lock(&self.script);
        for _ in 0..count {
            script.push_back(Err(error.clone()));
        }
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Reset the call log
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        lock(&self.prompts).push(prompt.to_string());

        match lock(&self.script).pop_front() {
            Some(outcome) => outcome,
            None => Ok(self.default_response.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct MockDocumentState {
    texts: HashMap<String, String>,
    submit_errors: VecDeque<ServiceError>,
    fetch_error: Option<ServiceError>,
    fail_processing: Option<String>,
    release_error: Option<ServiceError>,
    processing_polls: usize,
    pending_polls: HashMap<String, usize>,
    submitted: usize,
    released: usize,
    next_id: usize,
}

/// Mock document service for deterministic testing
///
/// Each submitted document reports `Processing` for a configurable number of
/// status polls before becoming ready. Clones share state, so a test can keep
/// a handle to inspect counters after passing the service to a client.
#[derive(Debug, Clone)]
pub struct MockDocumentService {
    default_text: String,
    state: Arc<Mutex<MockDocumentState>>,
}

impl MockDocumentService {
    /// Create a service returning `text` for every document
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            default_text: text.into(),
            state: Arc::new(Mutex::new(MockDocumentState::default())),
        }
    }

    /// Number of `Processing` polls before each document becomes ready
    pub fn with_processing_polls(self, polls: usize) -> Self {
        lock(&self.state).processing_polls = polls;
        self
    }

    /// Text returned for a document with the given file name
    pub fn add_text(&self, file_name: impl Into<String>, text: impl Into<String>) {
        lock(&self.state).texts.insert(file_name.into(), text.into());
    }

    /// Queue an error for the next submit call
    pub fn push_submit_error(&self, error: ServiceError) {
        lock(&self.state).submit_errors.push_back(error);
    }

    /// Make every fetch fail with the given error
    pub fn fail_fetch(&self, error: ServiceError) {
        lock(&self.state).fetch_error = Some(error);
    }

    /// Make processing end in the failed state
    pub fn fail_processing(&self, reason: impl Into<String>) {
        lock(&self.state).fail_processing = Some(reason.into());
    }

    /// Make every release fail with the given error
    pub fn fail_release(&self, error: ServiceError) {
        lock(&self.state).release_error = Some(error);
    }

    /// Number of successful submissions
    pub fn submitted(&self) -> usize {
        lock(&self.state).submitted
    }

    /// Number of release calls
    pub fn released(&self) -> usize {
        lock(&self.state).released
    }

    /// Handles submitted but not yet released
    pub fn outstanding(&self) -> usize {
        let state = lock(&self.state);
        state.submitted.saturating_sub(state.released)
    }
}

#[async_trait]
impl DocumentService for MockDocumentService {
    async fn submit(&self, path: &Path) -> Result<DocumentHandle, ServiceError> {
        let mut state = lock(&self.state);
        if let Some(error) = state.submit_errors.pop_front() {
            return Err(error);
        }

        state.next_id += 1;
        state.submitted += 1;
        let name = format!("files/mock-{}", state.next_id);
        let polls = state.processing_polls;
        state.pending_polls.insert(name.clone(), polls);

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(DocumentHandle {
            uri: format!("mock://{}", file_name),
            name,
            mime_type: "application/pdf".to_string(),
        })
    }

    async fn status(&self, handle: &DocumentHandle) -> Result<DocumentState, ServiceError> {
        let mut state = lock(&self.state);
        let remaining = state.pending_polls.entry(handle.name.clone()).or_insert(0);
        if *remaining > 0 {
            *remaining -= 1;
            return Ok(DocumentState::Processing);
        }
        match &state.fail_processing {
            Some(reason) => Ok(DocumentState::Failed(reason.clone())),
            None => Ok(DocumentState::Ready),
        }
    }

    async fn fetch_text(&self, handle: &DocumentHandle) -> Result<String, ServiceError> {
        let state = lock(&self.state);
        if let Some(error) = &state.fetch_error {
            return Err(error.clone());
        }
        let file_name = handle.uri.trim_start_matches("mock://");
        Ok(state
            .texts
            .get(file_name)
            .cloned()
            .unwrap_or_else(|| self.default_text.clone()))
    }

    async fn release(&self, handle: &DocumentHandle) -> Result<(), ServiceError> {
        let mut state = lock(&self.state);
        state.released += 1;
        state.pending_polls.remove(&handle.name);
        match &state.release_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regula_domain::ErrorKind;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete("any prompt").await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_script_order() {
        let provider = MockProvider::default();
        provider.push_response("first");
        provider.push_errors(ServiceError::transient("boom"), 2);
        provider.push_response("second");

        assert_eq!(provider.complete("a").await.unwrap(), "first");
        assert_eq!(provider.complete("b").await.unwrap_err().kind, ErrorKind::Transient);
        assert!(provider.complete("c").await.is_err());
        assert_eq!(provider.complete("d").await.unwrap(), "second");
        assert_eq!(provider.complete("e").await.unwrap(), "Default mock response");
        assert_eq!(provider.prompts(), vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete("test").await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);

        provider2.reset_call_count();
        assert_eq!(provider1.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_document_processing_polls() {
        let service = MockDocumentService::new("text").with_processing_polls(2);
        let handle = service.submit(Path::new("/in/a.pdf")).await.unwrap();

        assert_eq!(service.status(&handle).await.unwrap(), DocumentState::Processing);
        assert_eq!(service.status(&handle).await.unwrap(), DocumentState::Processing);
        assert_eq!(service.status(&handle).await.unwrap(), DocumentState::Ready);
        assert_eq!(service.fetch_text(&handle).await.unwrap(), "text");

        service.release(&handle).await.unwrap();
        assert_eq!(service.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_mock_document_text_per_file() {
        let service = MockDocumentService::new("default");
        service.add_text("karta.pdf", "KARTA WYPADKU");

        let handle = service.submit(Path::new("/in/karta.pdf")).await.unwrap();
        assert_eq!(service.fetch_text(&handle).await.unwrap(), "KARTA WYPADKU");
    }
}

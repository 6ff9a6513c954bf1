//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the remote
//! services. Implementations live in `regula-llm`.

use crate::ServiceError;
use async_trait::async_trait;
use std::path::Path;

/// Server-side handle for a submitted document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    /// Resource name used for status, fetch and release calls
    pub name: String,

    /// URI referencing the uploaded content in later requests
    pub uri: String,

    /// MIME type the document was uploaded with
    pub mime_type: String,
}

/// Processing state reported by the document service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    /// Still being processed
    Processing,

    /// Ready for text retrieval
    Ready,

    /// Processing failed on the server
    Failed(String),
}

/// Document-understanding service
///
/// Implemented by the infrastructure layer (regula-llm)
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Upload a document, allocating a server-side resource
    async fn submit(&self, path: &Path) -> Result<DocumentHandle, ServiceError>;

    /// Current processing state of an uploaded document
    async fn status(&self, handle: &DocumentHandle) -> Result<DocumentState, ServiceError>;

    /// Plain text derived from a ready document
    async fn fetch_text(&self, handle: &DocumentHandle) -> Result<String, ServiceError>;

    /// Free the server-side resource
    async fn release(&self, handle: &DocumentHandle) -> Result<(), ServiceError>;
}

/// Text-completion service
///
/// Implemented by the infrastructure layer (regula-llm)
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Complete a prompt into a text response
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

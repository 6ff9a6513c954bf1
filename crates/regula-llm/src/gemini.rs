//! Gemini Provider Implementation
//!
//! Talks to the Generative Language API for both services:
//!
//! - documents are uploaded through the resumable Files API, polled until
//!   they leave `PROCESSING`, transcribed with `generateContent`, then deleted
//! - prompts are completed with `generateContent`
//!
//! Every failure is classified into an [`ErrorKind`] here, so callers never
//! inspect error text.
//!
//! # Examples
//!
//! ```no_run
//! use regula_llm::{GeminiClient, GeminiConfig};
//!
//! let config = GeminiConfig::from_env("GEMINI_API_KEY", "gemini-2.0-flash-lite").unwrap();
//! let client = GeminiClient::new(config).unwrap();
//! ```

use crate::LlmError;
use async_trait::async_trait;
use regula_domain::traits::{CompletionProvider, DocumentHandle, DocumentService, DocumentState};
use regula_domain::{ErrorKind, ServiceError};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Default Generative Language API endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default timeout for a single HTTP request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Instruction sent alongside an uploaded document to obtain its text
pub const DEFAULT_OCR_INSTRUCTION: &str = "Przepisz dokładnie treść tego dokumentu.";

const ERROR_EXCERPT_CHARS: usize = 300;

/// Connection settings for one Gemini model
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API endpoint, without trailing slash
    pub base_url: String,

    /// API key
    pub api_key: SecretString,

    /// Model used for `generateContent`
    pub model: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Instruction used when transcribing documents
    pub ocr_instruction: String,
}

impl GeminiConfig {
    /// Settings with default endpoint and timeout
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ocr_instruction: DEFAULT_OCR_INSTRUCTION.to_string(),
        }
    }

    /// Read the API key from an environment variable
    pub fn from_env(var: &str, model: impl Into<String>) -> Result<Self, LlmError> {
        let key = std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(var.to_string()))?;
        Ok(Self::new(SecretString::from(key), model))
    }

    /// Override the endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Gemini API client implementing both service traits
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    File { file_data: FileData<'a> },
}

#[derive(Serialize)]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Deserialize)]
struct FileResource {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(rename = "mimeType", default)]
    mime_type: String,
    state: Option<String>,
    error: Option<FileError>,
}

#[derive(Deserialize)]
struct FileError {
    #[serde(default)]
    message: String,
}

impl GeminiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Config` if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Model used by this client
    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, parts: Vec<RequestPart<'_>>) -> Result<String, ServiceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = GenerateRequest {
            contents: vec![RequestContent { parts }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let response: GenerateResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::permanent(format!("Failed to parse response: {}", e)))?;

        response_text(response)
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "Requesting completion");
        self.generate(vec![RequestPart::Text { text: prompt }]).await
    }
}

#[async_trait]
impl DocumentService for GeminiClient {
    async fn submit(&self, path: &Path) -> Result<DocumentHandle, ServiceError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ServiceError::permanent(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let display_name = format!("regula-{}", Uuid::now_v7());

        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.config.base_url))
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type.as_str())
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(transport_error)?;
        let start = ensure_success(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::permanent("Upload session returned no upload URL"))?
            .to_string();

        let upload = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;

        let uploaded: UploadResponse = ensure_success(upload)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::permanent(format!("Failed to parse upload response: {}", e)))?;

        let mime_type = if uploaded.file.mime_type.is_empty() {
            mime_type
        } else {
            uploaded.file.mime_type
        };

        Ok(DocumentHandle {
            name: uploaded.file.name,
            uri: uploaded.file.uri,
            mime_type,
        })
    }

    async fn status(&self, handle: &DocumentHandle) -> Result<DocumentState, ServiceError> {
        let response = self
            .client
            .get(format!("{}/v1beta/{}", self.config.base_url, handle.name))
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        let file: FileResource = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ServiceError::permanent(format!("Failed to parse file status: {}", e)))?;

        Ok(file_state(&file))
    }

    async fn fetch_text(&self, handle: &DocumentHandle) -> Result<String, ServiceError> {
        let instruction = self.config.ocr_instruction.as_str();
        self.generate(vec![
            RequestPart::Text { text: instruction },
            RequestPart::File {
                file_data: FileData {
                    mime_type: &handle.mime_type,
                    file_uri: &handle.uri,
                },
            },
        ])
        .await
    }

    async fn release(&self, handle: &DocumentHandle) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(format!("{}/v1beta/{}", self.config.base_url, handle.name))
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}

fn file_state(file: &FileResource) -> DocumentState {
    match file.state.as_deref() {
        Some("ACTIVE") => DocumentState::Ready,
        Some("FAILED") => DocumentState::Failed(
            file.error
                .as_ref()
                .map(|e| e.message.clone())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("{} failed processing", file.name)),
        ),
        _ => DocumentState::Processing,
    }
}

/// Finish reasons that mean the content was blocked
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

fn response_text(response: GenerateResponse) -> Result<String, ServiceError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => ServiceError::permanent(format!("Prompt blocked: {}", reason)),
            None => ServiceError::transient("Empty response: no candidates"),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        let message = format!("Empty response (finish reason: {})", reason);
        return Err(if BLOCKED_FINISH_REASONS.contains(&reason) {
            ServiceError::permanent(message)
        } else {
            ServiceError::transient(message)
        });
    }

    Ok(text)
}

async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(classify_http_error(status, &body))
}

/// Classify a non-success HTTP response
pub(crate) fn classify_http_error(status: StatusCode, body: &str) -> ServiceError {
    let lower = body.to_lowercase();
    let kind = if status == StatusCode::TOO_MANY_REQUESTS
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
        || lower.contains("rate limit")
    {
        ErrorKind::RateLimited
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ErrorKind::Transient
    } else {
        ErrorKind::Permanent
    };

    let excerpt: String = body.chars().take(ERROR_EXCERPT_CHARS).collect();
    ServiceError::new(kind, format!("HTTP {}: {}", status, excerpt.trim()))
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::transient(format!("Request failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeminiConfig {
        GeminiConfig::new(SecretString::from("test-key".to_string()), "gemini-2.0-flash-lite")
    }

    #[test]
    fn test_client_creation() {
        let client = GeminiClient::new(config()).unwrap();
        assert_eq!(client.model(), "gemini-2.0-flash-lite");
        assert_eq!(client.config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = config().with_base_url("http://localhost:8080/");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("test-key"));
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = classify_http_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.kind, ErrorKind::RateLimited);

        let body = r#"{"error": {"code": 403, "message": "Quota exceeded for metric", "status": "PERMISSION_DENIED"}}"#;
        let err = classify_http_error(StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind, ErrorKind::RateLimited);

        let body = r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#;
        let err = classify_http_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.kind, ErrorKind::RateLimited);
    }

    #[test]
    fn test_classify_transient_and_permanent() {
        let err = classify_http_error(StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        assert_eq!(err.kind, ErrorKind::Transient);

        let err = classify_http_error(StatusCode::NOT_FOUND, "model not found");
        assert_eq!(err.kind, ErrorKind::Permanent);
        assert!(err.message.starts_with("HTTP 404"));
    }

    #[test]
    fn test_error_excerpt_is_bounded() {
        let body = "x".repeat(10_000);
        let err = classify_http_error(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(err.message.len() < 400);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                "finishReason": "STOP"
            }]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response_text(response).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_response_text_blocked_prompt() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        let err = response_text(response).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Permanent);
        assert!(err.message.contains("SAFETY"));
    }

    #[test]
    fn test_response_text_without_candidates_is_retried() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        let err = response_text(response).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transient);
    }

    #[test]
    fn test_response_text_empty_candidate_by_finish_reason() {
        let empty = |reason: &str| {
            let json = format!(r#"{{"candidates": [{{"content": {{"parts": []}}, "finishReason": "{}"}}]}}"#, reason);
            response_text(serde_json::from_str(&json).unwrap()).unwrap_err()
        };

        assert_eq!(empty("SAFETY").kind, ErrorKind::Permanent);
        assert_eq!(empty("PROHIBITED_CONTENT").kind, ErrorKind::Permanent);
        assert_eq!(empty("OTHER").kind, ErrorKind::Transient);
        let err = empty("MAX_TOKENS");
        assert_eq!(err.kind, ErrorKind::Transient);
        assert!(err.message.contains("MAX_TOKENS"));
    }

    #[test]
    fn test_file_state_mapping() {
        let parse = |json: &str| file_state(&serde_json::from_str::<FileResource>(json).unwrap());

        assert_eq!(parse(r#"{"name": "files/a", "state": "PROCESSING"}"#), DocumentState::Processing);
        assert_eq!(parse(r#"{"name": "files/a", "state": "ACTIVE"}"#), DocumentState::Ready);
        assert_eq!(
            parse(r#"{"name": "files/a", "state": "FAILED", "error": {"message": "bad pdf"}}"#),
            DocumentState::Failed("bad pdf".to_string())
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![
                    RequestPart::Text { text: "transcribe" },
                    RequestPart::File {
                        file_data: FileData {
                            mime_type: "application/pdf",
                            file_uri: "https://example/files/a",
                        },
                    },
                ],
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "transcribe");
        assert_eq!(
            value["contents"][0]["parts"][1]["file_data"]["mime_type"],
            "application/pdf"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        let config = config()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let client = GeminiClient::new(config).unwrap();

        let err = client.complete("test").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transient);
    }

    #[tokio::test]
    async fn test_submit_missing_file_is_permanent() {
        let client = GeminiClient::new(config()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = client.submit(&dir.path().join("missing.pdf")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Permanent);
    }

    // Integration test (requires GEMINI_API_KEY and network access)
    #[tokio::test]
    #[ignore]
    async fn test_gemini_complete_integration() {
        let config = GeminiConfig::from_env("GEMINI_API_KEY", "gemini-2.0-flash-lite").unwrap();
        let client = GeminiClient::new(config).unwrap();
        let response = client.complete("Odpowiedz jednym słowem: tak").await.unwrap();
        assert!(!response.is_empty());
    }
}

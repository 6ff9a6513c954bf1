//! Document text extraction over the submit/poll/fetch/release protocol

use regula_domain::traits::{DocumentHandle, DocumentService, DocumentState};
use regula_domain::ServiceError;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default pause between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default upper bound on time spent waiting for processing
pub const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(600);

/// Extracts plain text from documents through a [`DocumentService`]
///
/// Every handle allocated by `submit` is released before `extract_text`
/// returns, whatever the outcome. Release failures are logged and dropped.
///
/// # Examples
///
/// ```
/// use regula_llm::{DocumentTextClient, MockDocumentService};
/// use std::path::Path;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let service = MockDocumentService::new("Treść dokumentu").with_processing_polls(1);
/// let client = DocumentTextClient::new(service.clone())
///     .with_poll_interval(Duration::from_millis(1));
///
/// let text = client.extract_text(Path::new("karta.pdf")).await.unwrap();
/// assert_eq!(text, "Treść dokumentu");
/// assert_eq!(service.outstanding(), 0);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct DocumentTextClient<S> {
    service: S,
    poll_interval: Duration,
    processing_timeout: Duration,
}

impl<S: DocumentService> DocumentTextClient<S> {
    /// Create a client with the default polling settings
    pub fn new(service: S) -> Self {
        Self {
            service,
            poll_interval: DEFAULT_POLL_INTERVAL,
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
        }
    }

    /// Set the pause between status polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set how long to wait for processing before giving up
    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    /// The underlying service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Extract the text of one document
    ///
    /// # Errors
    ///
    /// Returns the first error raised by submit, status or fetch. A document
    /// the service reports as failed yields a permanent error; one still
    /// processing after the timeout yields a transient error.
    pub async fn extract_text(&self, path: &Path) -> Result<String, ServiceError> {
        let handle = self.service.submit(path).await?;
        debug!(handle = %handle.name, path = %path.display(), "Document submitted");

        let result = self.wait_and_fetch(&handle).await;

        if let Err(e) = self.service.release(&handle).await {
            debug!(handle = %handle.name, error = %e, "Ignoring release failure");
        }

        result
    }

    async fn wait_and_fetch(&self, handle: &DocumentHandle) -> Result<String, ServiceError> {
        let started = Instant::now();

        loop {
            match self.service.status(handle).await? {
                DocumentState::Ready => return self.service.fetch_text(handle).await,
                DocumentState::Failed(reason) => {
                    return Err(ServiceError::permanent(format!(
                        "Document processing failed: {}",
                        reason
                    )));
                }
                DocumentState::Processing => {
                    if started.elapsed() >= self.processing_timeout {
                        return Err(ServiceError::transient(format!(
                            "Document still processing after {:?}",
                            self.processing_timeout
                        )));
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

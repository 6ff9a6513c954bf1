//! Errors raised by the external services

use thiserror::Error;

/// How a service failure should be treated by retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Quota or rate limit hit; retry with a growing backoff
    RateLimited,

    /// Timeout, connection failure or server error; retry after a short pause
    Transient,

    /// Retrying cannot help (bad request, malformed response, failed processing)
    Permanent,
}

impl ErrorKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Transient => "transient",
            ErrorKind::Permanent => "permanent",
        }
    }

    /// Whether a failure of this kind is worth another attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorKind::Permanent)
    }
}

/// Failure of a remote call, tagged by the wrapper that observed it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    /// Retry classification
    pub kind: ErrorKind,

    /// Human-readable description (status code, body excerpt, ...)
    pub message: String,
}

impl ServiceError {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Quota or rate-limit failure
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Retryable failure
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    /// Non-retryable failure
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permanent, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::Transient.is_retryable());
        assert!(!ErrorKind::Permanent.is_retryable());
    }

    #[test]
    fn test_display_is_message() {
        let err = ServiceError::rate_limited("HTTP 429: quota exceeded");
        assert_eq!(err.to_string(), "HTTP 429: quota exceeded");
        assert_eq!(err.kind, ErrorKind::RateLimited);
    }
}

//! HTTP client and wire types for the ML recommendation service.

mod client;
pub mod types;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use client::{MlClient, USER_AGENT};

/// Categories of API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection refused, DNS failure, timeout, body read failure
    Transport,
    /// Non-2xx status whose body could not be interpreted
    HttpStatus,
    /// 2xx status with a body that is not the expected JSON
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the ML service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw response body)
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Classifies a reqwest failure, keeping the source chain in the message.
    pub fn transport(e: &reqwest::Error) -> Self {
        let mut message = if e.is_timeout() {
            format!("Request timed out: {e}")
        } else if e.is_connect() {
            format!("Connection failed: {e}")
        } else {
            e.to_string()
        };

        let mut source = std::error::Error::source(e);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::new(ApiErrorKind::Transport, message)
    }

    /// Creates an HTTP status error.
    pub fn http_status(status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        Self {
            kind: ApiErrorKind::HttpStatus,
            message: format!("HTTP {status}"),
            details: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    pub fn parse(e: &serde_json::Error, body: &str) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: format!("Invalid JSON response: {e}"),
            details: Some(body.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) if self.kind == ApiErrorKind::HttpStatus => {
                write!(f, "{}: {details}", self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display_includes_body() {
        let err = ApiError::http_status(502, "  Bad Gateway\n");
        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    }

    #[test]
    fn test_http_status_empty_body() {
        let err = ApiError::http_status(500, "");
        assert_eq!(err.to_string(), "HTTP 500");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_parse_error_keeps_body_out_of_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = ApiError::parse(&json_err, "<html>");
        assert!(err.to_string().starts_with("Invalid JSON response"));
        assert_eq!(err.details.as_deref(), Some("<html>"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ApiErrorKind::HttpStatus.to_string(), "http_status");
        assert_eq!(ApiErrorKind::Transport.to_string(), "transport");
    }
}

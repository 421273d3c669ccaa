//! Error types for hypermedia context operations.
//!
//! The [`Result`] type alias provides a convenient shorthand for operations
//! that may fail.
//!
//! # Error Categories
//!
//! | Category | Variants | Resource state after failure |
//! |----------|----------|------------------------------|
//! | HTTP | `Http` | Unmodified |
//! | Network | `Transport` | Unmodified |
//! | Body | `Json`, `Body` | Unmodified |
//!
//! The context layer never retries, never logs-and-swallows, and never leaves
//! a resource partially merged: every failure is surfaced to the caller with
//! the resource exactly as it was before the verb call.

use thiserror::Error;

/// Result type for hypermedia context operations.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors that can occur while synchronizing a resource over HTTP.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ContextError {
    /// The server answered with a non-2xx status.
    ///
    /// Carries the status code and the raw response body for diagnosis.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level failure (connection refused, DNS, mid-stream error).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded as JSON where JSON was expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response body decoded but does not have the expected shape
    /// (e.g. a JSON array where a resource object was required).
    #[error("Body error: {0}")]
    Body(String),
}

impl ContextError {
    /// The HTTP status code, when this error carries one.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ContextError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error was produced by a server response (as opposed to
    /// a failure to reach the server or to decode what it sent).
    #[inline]
    #[must_use]
    pub fn is_http(&self) -> bool {
        matches!(self, ContextError::Http { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_carries_status() {
        let err = ContextError::Http {
            status: 404,
            body: "not found".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_http());
    }

    #[test]
    fn test_transport_error_has_no_status() {
        let err = ContextError::Transport("connection refused".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_http());
    }

    #[test]
    fn test_error_display() {
        let err = ContextError::Http {
            status: 503,
            body: "busy".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ContextError = json_err.into();
        assert!(matches!(err, ContextError::Json(_)));
    }
}

//! Error types surfaced by the request engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned to callers of the request engine
///
/// Retry exhaustion never produces a new kind: the last observed error is
/// returned unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "camelCase")]
pub enum EngineError {
    /// A token failed validation (length, whitespace, expiry)
    #[error("Invalid token format: {0}")]
    InvalidTokenFormat(String),

    /// The server answered with a failure status or a `success: false` envelope
    #[error("Request failed with status {status}: {message}")]
    #[serde(rename_all = "camelCase")]
    RequestFailed { status: u16, message: String, code: Option<String>, retriable: bool },

    /// The caller or the engine shutdown cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// The request did not complete within its deadline
    #[error("Request timed out after {timeout_ms}ms")]
    #[serde(rename_all = "camelCase")]
    Timeout { timeout_ms: u64 },

    /// No connectivity, or the server could not be reached
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The request may have reached the server but no complete response came
    /// back; resending a mutation could apply it twice
    #[error("Response interrupted: {0}")]
    ResponseInterrupted(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Token or queue storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn request_failed(
        status: u16,
        message: impl Into<String>,
        code: Option<String>,
        retriable: bool,
    ) -> Self {
        Self::RequestFailed { status, message: message.into(), code, retriable }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkUnavailable(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether a later attempt of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed { retriable, .. } => *retriable,
            Self::Timeout { .. } | Self::NetworkUnavailable(_) | Self::ResponseInterrupted(_) => {
                true
            }
            Self::InvalidTokenFormat(_)
            | Self::Cancelled
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Internal(_) => false,
        }
    }

    /// HTTP status when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True for 401 responses, which invalidate the stored credential
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_kind() {
        assert!(EngineError::request_failed(503, "unavailable", None, true).is_retryable());
        assert!(!EngineError::request_failed(404, "not found", None, false).is_retryable());
        assert!(EngineError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(EngineError::network("offline").is_retryable());
        assert!(EngineError::ResponseInterrupted("body read".into()).is_retryable());
        assert!(!EngineError::Cancelled.is_retryable());
        assert!(!EngineError::InvalidTokenFormat("short".into()).is_retryable());
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = EngineError::request_failed(503, "Service unavailable", None, true);
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["type"], "requestFailed");
        assert_eq!(json["details"]["status"], 503);
        assert_eq!(json["details"]["retriable"], true);

        let json = serde_json::to_value(EngineError::Timeout { timeout_ms: 250 }).unwrap();
        assert_eq!(json["details"]["timeoutMs"], 250);
    }

    #[test]
    fn status_and_unauthorized() {
        let err = EngineError::request_failed(401, "Authentication required", None, false);
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(EngineError::Cancelled.status(), None);
    }
}

//! Transport abstraction

use async_trait::async_trait;
use courier_common::error::{ErrorClassification, ErrorSeverity};
use courier_domain::{Headers, HttpMethod};
use serde_json::Value;
use thiserror::Error;

/// A fully resolved outbound request
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Value>,
}

/// Status and raw body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures that prevent a complete response from being received
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    /// No connection was established, so the server never saw the request
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failed after the request may have been sent, e.g. while reading the
    /// response body
    #[error("transport failure: {0}")]
    Other(String),
}

impl ErrorClassification for TransportError {
    fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout(_) | Self::Connect(_) => ErrorSeverity::Warning,
            Self::InvalidRequest(_) | Self::Other(_) => ErrorSeverity::Error,
        }
    }
}

/// Sends one request and returns the raw response
///
/// Implementations must not retry; the executor owns retry and timeout
/// policy. Dropping the returned future must abort the request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

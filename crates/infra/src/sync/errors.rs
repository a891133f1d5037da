//! Offline queue error types
//!
//! Queue failures stay in this type while they move through the persistence
//! layer and are folded into [`EngineError::Storage`] at the public boundary.

use courier_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use courier_common::impl_error_conversion;
use courier_domain::EngineError;
use thiserror::Error;

/// Offline queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("Queue item not found: {0}")]
    ItemNotFound(String),

    #[error("Queue file {path} is corrupted: {reason}")]
    Corrupted { path: String, reason: String },

    #[error("Replay worker {0}")]
    WorkerState(String),
}

impl_error_conversion!(QueueError, Common);

impl QueueError {
    pub fn corrupted(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupted { path: path.into(), reason: reason.into() }
    }
}

impl ErrorClassification for QueueError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Common(inner) => inner.is_retryable(),
            Self::ItemNotFound(_) | Self::Corrupted { .. } | Self::WorkerState(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Common(inner) => inner.severity(),
            Self::ItemNotFound(_) | Self::WorkerState(_) => ErrorSeverity::Warning,
            Self::Corrupted { .. } => ErrorSeverity::Critical,
        }
    }
}

impl From<QueueError> for EngineError {
    fn from(err: QueueError) -> Self {
        EngineError::storage(err.to_string())
    }
}

pub type QueueResult<T> = Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_become_persistence_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = QueueError::from(io);

        assert!(matches!(err, QueueError::Common(CommonError::Persistence { .. })));
        assert!(!err.is_retryable());
    }

    #[test]
    fn corruption_is_critical_and_maps_to_storage() {
        let err = QueueError::corrupted("/tmp/q.json", "expected array");
        assert!(err.is_critical());

        let engine: EngineError = err.into();
        assert!(matches!(engine, EngineError::Storage(msg) if msg.contains("expected array")));
    }
}

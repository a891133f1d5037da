//! Conversions from external infrastructure errors into engine errors.

use courier_domain::EngineError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the engine error.
#[derive(Debug)]
pub struct InfraError(pub EngineError);

impl From<InfraError> for EngineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<EngineError> for InfraError {
    fn from(value: EngineError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → EngineError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(err: std::io::Error) -> Self {
        InfraError(EngineError::Storage(format!("{} ({:?})", err, err.kind())))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → EngineError */
/* -------------------------------------------------------------------------- */

impl From<reqwest::Error> for InfraError {
    fn from(err: reqwest::Error) -> Self {
        let engine = if err.is_timeout() {
            EngineError::Timeout { timeout_ms: 0 }
        } else if err.is_builder() {
            EngineError::Config(format!("invalid HTTP client configuration: {err}"))
        } else if err.is_connect() {
            EngineError::NetworkUnavailable(format!("http connection failed: {err}"))
        } else if err.is_request() || err.is_body() || err.is_decode() {
            EngineError::ResponseInterrupted(format!("http exchange failed: {err}"))
        } else {
            EngineError::Internal(format!("http error: {err}"))
        };
        InfraError(engine)
    }
}

/* -------------------------------------------------------------------------- */
/* serialization errors → EngineError */
/* -------------------------------------------------------------------------- */

impl From<toml::de::Error> for InfraError {
    fn from(err: toml::de::Error) -> Self {
        InfraError(EngineError::Config(format!("Invalid TOML format: {err}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(err: serde_json::Error) -> Self {
        InfraError(EngineError::Config(format!("Invalid JSON format: {err}")))
    }
}

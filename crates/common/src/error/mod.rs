//! Common error types shared by every Courier crate
//!
//! `CommonError` covers the failures that show up in more than one layer:
//! bad configuration values, encoding problems and file I/O. Module-specific
//! errors compose with it instead of duplicating variants:
//!
//! ```rust,ignore
//! #[derive(Debug, thiserror::Error)]
//! pub enum QueueError {
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//!
//!     #[error("Item not found: {0}")]
//!     ItemNotFound(String),
//! }
//!
//! impl_error_conversion!(QueueError, Common);
//! ```
//!
//! Every error type should implement [`ErrorClassification`] so retry and
//! logging decisions are made the same way everywhere.

use std::fmt;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Common error variants that appear across multiple modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Serialization or deserialization errors
    Serialization { message: String, format: Option<String> },

    /// File I/O errors
    Persistence { message: String },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field: Some(field) } => {
                write!(f, "Configuration error in field '{field}': {message}")
            }
            Self::Config { message, field: None } => write!(f, "Configuration error: {message}"),
            Self::Serialization { message, format: Some(format) } => {
                write!(f, "Serialization error ({format}): {message}")
            }
            Self::Serialization { message, format: None } => {
                write!(f, "Serialization error: {message}")
            }
            Self::Persistence { message } => write!(f, "Persistence error: {message}"),
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    /// None of these change between attempts; the caller has to fix the input
    /// or the disk first.
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }
}

impl CommonError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Configuration error bound to a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    pub fn serialization_format<S: Into<String>, F: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence { message: message.into() }
    }
}

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Whether the failed operation may succeed if attempted again
    fn is_retryable(&self) -> bool;

    /// Severity used for logging and alerting decisions
    fn severity(&self) -> ErrorSeverity;

    /// Whether this error requires immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Degraded but operational
    Warning,
    /// Failure requiring attention
    Error,
    /// System integrity at risk
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// Standard conversions from common error types
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}

/// Generate `From` conversions for std error types on a module-specific
/// error enum that embeds `CommonError` in the given variant.
///
/// ```rust,ignore
/// impl_error_conversion!(QueueError, Common);
/// ```
#[macro_export]
macro_rules! impl_error_conversion {
    ($error_type:ty, $variant:ident) => {
        impl From<serde_json::Error> for $error_type {
            fn from(err: serde_json::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }

        impl From<std::io::Error> for $error_type {
            fn from(err: std::io::Error) -> Self {
                Self::$variant($crate::error::CommonError::from(err))
            }
        }
    };
}

//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events. Binaries and tests call
//! [`init_tracing`] once to decide where they go.

use std::str::FromStr;

use courier_domain::{EngineError, EngineResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(EngineError::config(format!("Unknown log format: {other}"))),
        }
    }
}

/// Subscriber settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_directive: String,
    pub format: LogFormat,
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self { default_directive: "info".to_string(), format: LogFormat::Text, with_target: true }
    }
}

impl TracingConfig {
    /// Defaults with the format taken from `COURIER_LOG_FORMAT` when set
    pub fn from_env() -> EngineResult<Self> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("COURIER_LOG_FORMAT") {
            config.format = raw.parse()?;
        }
        Ok(config)
    }

    fn filter(&self) -> EngineResult<EnvFilter> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_directive))
            .map_err(|e| {
                EngineError::config(format!(
                    "Invalid log filter '{}': {e}",
                    self.default_directive
                ))
            })
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns `EngineError::Config` for an invalid filter or when a global
/// subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> EngineResult<()> {
    let registry = tracing_subscriber::registry().with(config.filter()?);

    let result = match config.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(config.with_target)).try_init(),
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_target(config.with_target)).try_init()
        }
    };

    result.map_err(|e| EngineError::config(format!("Failed to install tracing subscriber: {e}")))
}

//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when `COURIER_API_BASE` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//!
//! Either way the result is validated before it is returned.
//!
//! ## Environment Variables
//! - `COURIER_API_BASE` (required)
//! - `COURIER_CACHE_TIMEOUT_MS`, `COURIER_MAX_RETRIES`, `COURIER_TIMEOUT_MS`,
//!   `COURIER_MAX_CACHE_ENTRIES`
//! - `COURIER_ENABLE_CACHE` (`1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`)
//! - `COURIER_RETRY_BASE_DELAY_MS`, `COURIER_RETRY_MAX_DELAY_MS`,
//!   `COURIER_RETRY_JITTER_FACTOR`
//! - `COURIER_QUEUE_PATH`, `COURIER_TOKEN_PATH`
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! `courier.json`, `courier.toml`, `config.json` and `config.toml`, looked up
//! in the working directory, its two parents, then next to the executable.
//! The format follows the extension; keys are camelCase in both formats.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use courier_domain::{EngineConfig, EngineError, EngineResult};
use tracing::{debug, info};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["courier.json", "courier.toml", "config.json", "config.toml"];

/// Load from the environment, falling back to a config file
///
/// # Errors
/// Returns `EngineError::Config` when neither source yields a valid config.
pub fn load() -> EngineResult<EngineConfig> {
    match load_from_env() {
        Ok(config) => {
            info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            debug!(error = %e, "environment configuration unavailable, trying file");
            load_from_file(None)
        }
    }
}

/// Load from `COURIER_*` environment variables
///
/// # Errors
/// Returns `EngineError::Config` when `COURIER_API_BASE` is missing, a value
/// does not parse, or the result fails validation.
pub fn load_from_env() -> EngineResult<EngineConfig> {
    let mut config = EngineConfig::new(env_var("COURIER_API_BASE")?);

    if let Some(v) = env_parse("COURIER_CACHE_TIMEOUT_MS")? {
        config.cache_timeout_ms = v;
    }
    if let Some(v) = env_parse("COURIER_MAX_RETRIES")? {
        config.max_retries = v;
    }
    if let Some(v) = env_parse("COURIER_TIMEOUT_MS")? {
        config.timeout_ms = v;
    }
    if let Some(v) = env_parse("COURIER_MAX_CACHE_ENTRIES")? {
        config.max_cache_entries = v;
    }
    config.enable_cache = env_bool("COURIER_ENABLE_CACHE", config.enable_cache);
    if let Some(v) = env_parse("COURIER_RETRY_BASE_DELAY_MS")? {
        config.retry_base_delay_ms = v;
    }
    if let Some(v) = env_parse("COURIER_RETRY_MAX_DELAY_MS")? {
        config.retry_max_delay_ms = v;
    }
    if let Some(v) = env_parse("COURIER_RETRY_JITTER_FACTOR")? {
        config.retry_jitter_factor = v;
    }
    if let Ok(path) = std::env::var("COURIER_QUEUE_PATH") {
        config.queue_path = PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("COURIER_TOKEN_PATH") {
        config.token_path = PathBuf::from(path);
    }

    config.validate()?;
    Ok(config)
}

/// Load from `path`, or from the first probed location when `None`
///
/// # Errors
/// Returns `EngineError::Config` when the file is missing or unreadable,
/// its format is unsupported or invalid, or validation fails.
pub fn load_from_file(path: Option<PathBuf>) -> EngineResult<EngineConfig> {
    let config_path = match path {
        Some(p) if !p.exists() => {
            return Err(EngineError::config(format!("Config file not found: {}", p.display())));
        }
        Some(p) => p,
        None => probe_config_paths().ok_or_else(|| {
            EngineError::config("No config file found in any of the standard locations")
        })?,
    };

    info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| EngineError::config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> EngineResult<EngineConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents).map_err(|e| InfraError::from(e).into()),
        other => Err(EngineError::config(format!("Unsupported config format: {other}"))),
    }
}

/// First existing config file among the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> EngineResult<String> {
    std::env::var(key)
        .map_err(|_| EngineError::config(format!("Missing required environment variable: {key}")))
}

/// Parsed value of an optional variable
fn env_parse<T>(key: &str) -> EngineResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| EngineError::config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` in any case
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

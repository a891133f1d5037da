//! Configuration loading
//!
//! Builds an [`EngineConfig`](courier_domain::EngineConfig) from `COURIER_*`
//! environment variables or a config file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

//! # Courier Infrastructure
//!
//! The impure half of Courier: everything that touches the network, the
//! filesystem or a clock.
//!
//! - [`api`]: request executor, response cache, retry policy, interceptors
//!   and the [`ApiClient`](api::ApiClient) facade
//! - [`auth`]: bearer token resolution over durable, session and cookie stores
//! - [`http`]: the [`Transport`](http::Transport) seam and its reqwest
//!   implementation
//! - [`sync`]: offline action queue, connectivity monitor and replay worker
//! - [`config`]: loading [`EngineConfig`](courier_domain::EngineConfig)
//! - [`observability`]: tracing subscriber setup
//!
//! ## Architecture
//! - Data types and the error taxonomy live in `courier-domain`
//! - Generic building blocks (TTL cache, backoff, clocks) live in
//!   `courier-common`

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod sync;

pub use api::{ApiClient, RequestExecutor};
pub use auth::TokenProvider;
pub use errors::InfraError;
pub use observability::{init_tracing, LogFormat, TracingConfig};
pub use sync::{ConnectivityMonitor, OfflineQueue, ReplayWorker};

//! Request engine
//!
//! [`RequestExecutor`] runs each request through the [`ResponseCache`], the
//! [`InterceptorChain`], the bearer token lookup, the transport and the
//! [`RetryPolicy`]. [`ApiClient`] adds the offline queue on top for mutating
//! actions.

mod cache;
mod client;
mod errors;
mod executor;
mod interceptors;
mod retry;

pub use cache::{CacheKey, ResponseCache};
pub use client::ApiClient;
pub use errors::{
    error_from_envelope, error_from_status, is_safe_message, sanitize_message, status_message,
};
pub use executor::{RequestExecutor, RequestExecutorBuilder};
pub use interceptors::{InterceptorChain, InterceptorError, RequestInterceptor, ResponseInterceptor};
pub use retry::RetryPolicy;

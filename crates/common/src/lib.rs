//! Shared building blocks for the Courier crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors and the clock abstraction
//! - `runtime`: TTL-aware LRU cache and exponential backoff

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod time;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache::{CacheStats, TtlLruCache};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::ExponentialBackoff;
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock};

//! Resilience primitives
//!
//! Currently exponential backoff with additive jitter. Retry eligibility is
//! decided by the caller; this module only answers "how long to wait".

mod backoff;

pub use backoff::{
    ExponentialBackoff, DEFAULT_BASE_DELAY, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY,
    MAX_BACKOFF_EXPONENT,
};

// Exponential backoff with additive jitter
use std::time::Duration;

use rand::Rng;

use crate::error::{CommonError, CommonResult};

/// Default base delay for the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default maximum delay cap
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Default jitter factor (0.0 = no jitter, 1.0 = up to double the delay)
pub const DEFAULT_JITTER_FACTOR: f64 = 0.3;

/// Maximum exponent for the doubling step, prevents overflow
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Exponential backoff calculator
///
/// The delay for attempt `n` is `base * 2^n`, plus a random jitter drawn
/// from `[0, jitter_factor * delay]`, then capped at `max_delay`. Jitter is
/// only ever added, and the cap is applied last, so successive delays never
/// decrease.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl ExponentialBackoff {
    /// Create a backoff with validated bounds
    pub fn new(base_delay: Duration, max_delay: Duration) -> CommonResult<Self> {
        if base_delay.is_zero() {
            return Err(CommonError::config_field("base_delay", "must be greater than zero"));
        }

        if base_delay > max_delay {
            return Err(CommonError::config(format!(
                "base_delay ({:?}) cannot be greater than max_delay ({:?})",
                base_delay, max_delay
            )));
        }

        Ok(Self { base_delay, max_delay, jitter_factor: DEFAULT_JITTER_FACTOR })
    }

    /// Set the jitter factor, clamped to `[0.0, 1.0]`
    #[must_use]
    pub fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
        self
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    /// Delay before retrying after `attempt` (0-based), jitter included
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with_rng(attempt, &mut rand::thread_rng())
    }

    /// Same as [`delay`](Self::delay) with a caller-provided RNG
    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let delay_millis = self.uncapped_millis(attempt);
        let max_millis = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);

        let jitter_range = (delay_millis as f64 * self.jitter_factor) as u64;
        let jitter = if jitter_range == 0 { 0 } else { rng.gen_range(0..=jitter_range) };

        Duration::from_millis(delay_millis.saturating_add(jitter).min(max_millis))
    }

    /// Delay before retrying after `attempt` without jitter, capped
    pub fn delay_without_jitter(&self, attempt: u32) -> Duration {
        let max_millis = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.uncapped_millis(attempt).min(max_millis))
    }

    fn uncapped_millis(&self, attempt: u32) -> u64 {
        let base_millis = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let multiplier = 2_u64.saturating_pow(attempt.min(MAX_BACKOFF_EXPONENT));
        base_millis.saturating_mul(multiplier)
    }
}

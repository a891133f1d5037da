//! Retry eligibility and backoff for the request executor
//!
//! The attempt budget counts the first try: a budget of 3 means one initial
//! attempt plus at most two retries. A budget of 0 is treated as 1 so every
//! request is sent at least once.

use std::time::Duration;

use courier_common::resilience::ExponentialBackoff;
use courier_domain::{EngineConfig, EngineError, EngineResult};

/// Decides whether a failed attempt is retried and how long to wait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    backoff: ExponentialBackoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { backoff: ExponentialBackoff::default() }
    }
}

impl RetryPolicy {
    pub fn new(backoff: ExponentialBackoff) -> Self {
        Self { backoff }
    }

    /// Policy using the backoff settings from `config`
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let backoff =
            ExponentialBackoff::new(config.retry_base_delay(), config.retry_max_delay())
                .map_err(|e| EngineError::config(e.to_string()))?
                .with_jitter_factor(config.retry_jitter_factor);
        Ok(Self { backoff })
    }

    /// HTTP statuses worth retrying: 408, 429 and every 5xx
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 408 | 429 | 500..=599)
    }

    /// Number of transport calls allowed for `max_retries`
    pub fn attempt_budget(max_retries: u32) -> u32 {
        max_retries.max(1)
    }

    /// Whether attempt `attempt` (0-based) that failed with `error` should be
    /// followed by another attempt
    pub fn should_retry(&self, attempt: u32, max_retries: u32, error: &EngineError) -> bool {
        error.is_retryable() && attempt.saturating_add(1) < Self::attempt_budget(max_retries)
    }

    /// Wait before the attempt following `attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    pub fn backoff(&self) -> &ExponentialBackoff {
        &self.backoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(status: u16) -> EngineError {
        EngineError::request_failed(status, "x", None, RetryPolicy::is_retryable_status(status))
    }

    #[test]
    fn classifies_statuses() {
        for status in [408, 429, 500, 502, 503, 504, 599] {
            assert!(RetryPolicy::is_retryable_status(status), "{status}");
        }
        for status in [400, 401, 403, 404, 409, 422, 200] {
            assert!(!RetryPolicy::is_retryable_status(status), "{status}");
        }
    }

    #[test]
    fn budget_includes_first_attempt() {
        let policy = RetryPolicy::default();
        let err = failed(503);

        assert!(policy.should_retry(0, 3, &err));
        assert!(policy.should_retry(1, 3, &err));
        assert!(!policy.should_retry(2, 3, &err));
    }

    #[test]
    fn zero_budget_still_allows_one_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(RetryPolicy::attempt_budget(0), 1);
        assert!(!policy.should_retry(0, 0, &failed(503)));
    }

    #[test]
    fn never_retries_terminal_errors() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(0, 5, &failed(401)));
        assert!(!policy.should_retry(0, 5, &failed(404)));
        assert!(!policy.should_retry(0, 5, &EngineError::Cancelled));
        assert!(policy.should_retry(0, 5, &EngineError::Timeout { timeout_ms: 10 }));
        assert!(policy.should_retry(0, 5, &EngineError::network("refused")));
    }

    #[test]
    fn invocation_count_matches_budget_formula() {
        let policy = RetryPolicy::default();
        let err = failed(503);

        for max_retries in 0..6u32 {
            for failures in 0..8u32 {
                // Simulate `failures` consecutive failures followed by success.
                let mut invocations = 0;
                let mut attempt = 0;
                loop {
                    invocations += 1;
                    if attempt >= failures {
                        break;
                    }
                    if !policy.should_retry(attempt, max_retries, &err) {
                        break;
                    }
                    attempt += 1;
                }

                let expected = failures.min(max_retries.max(1) - 1) + 1;
                assert_eq!(invocations, expected, "max_retries={max_retries} failures={failures}");
            }
        }
    }

    #[test]
    fn from_config_uses_configured_delays() {
        let config = EngineConfig {
            retry_base_delay_ms: 10,
            retry_max_delay_ms: 40,
            retry_jitter_factor: 0.0,
            ..EngineConfig::new("https://api.test")
        };
        let policy = RetryPolicy::from_config(&config).unwrap();

        assert_eq!(policy.backoff_delay(0), Duration::from_millis(10));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(20));
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(40));
    }
}

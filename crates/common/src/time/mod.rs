//! Clock abstraction for time-dependent code
//!
//! Cache TTLs and token expiry are evaluated against a [`Clock`] so tests can
//! move time forward without sleeping.
//!
//! ```
//! use std::time::Duration;
//!
//! use courier_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync {
    /// Monotonic timestamp suitable for measuring durations
    fn now(&self) -> Instant;

    /// Current wall clock time
    fn system_time(&self) -> SystemTime;

    /// Milliseconds since the UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        let millis = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }

    /// Whole seconds since the UNIX epoch
    fn secs_since_epoch(&self) -> i64 {
        let secs = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        i64::try_from(secs).unwrap_or(i64::MAX)
    }
}

/// Real system clock. Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock for deterministic tests
///
/// Clones share the same elapsed offset, so a clock handed to a component can
/// still be advanced from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    base_system_time: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock anchored at the current real time
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            base_system_time: SystemTime::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Simulate `duration` passing
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += duration;
    }

    /// Total simulated time since creation
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

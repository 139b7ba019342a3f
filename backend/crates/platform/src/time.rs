//! Clock abstraction
//!
//! Time-dependent logic (expiry, rate-limit windows) reads the time through
//! [`Clock`] so tests can move it deterministically.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Unix milliseconds
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FakeClock {
    t: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new_set(t: DateTime<Utc>) -> Self {
        Self {
            t: Arc::new(Mutex::new(t)),
        }
    }

    /// Start at a Unix millisecond instant
    pub fn at_ms(ms: i64) -> Self {
        Self::new_set(DateTime::from_timestamp_millis(ms).unwrap_or_default())
    }

    pub fn set(&self, t: DateTime<Utc>) {
        *self.t.lock().unwrap_or_else(|e| e.into_inner()) = t;
    }

    pub fn advance(&self, d: Duration) {
        let mut t = self.t.lock().unwrap_or_else(|e| e.into_inner());
        *t += d;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new_set(Utc::now())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.t.lock().unwrap_or_else(|e| e.into_inner())
    }
}

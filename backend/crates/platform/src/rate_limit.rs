//! Rate Limiting Infrastructure
//!
//! Fixed-window rate limiting abstractions and an in-process store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Start of the fixed window containing `now_ms`
    pub fn window_start(&self, now_ms: i64) -> i64 {
        let window_ms = self.window_ms().max(1);
        now_ms.div_euclid(window_ms) * window_ms
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

impl RateLimitResult {
    /// Derive the result from the post-increment request count
    pub fn from_count(count: u32, config: &RateLimitConfig, window_start_ms: i64) -> Self {
        Self {
            allowed: count <= config.max_requests,
            remaining: config.max_requests.saturating_sub(count),
            reset_at_ms: window_start_ms + config.window_ms(),
        }
    }
}

pub type RateLimitError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Check and increment rate limit counter
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Drop windows that ended before `now_ms`; returns how many were removed
    async fn sweep(&self, config: &RateLimitConfig, now_ms: i64) -> Result<u64, RateLimitError>;
}

/// In-process fixed-window counter store
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, (i64, u32)>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (i64, u32)>> {
        // A poisoned map only holds counters; keep serving
        self.windows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> Result<RateLimitResult, RateLimitError> {
        let window_start = config.window_start(now_ms);
        let mut windows = self.lock();

        let entry = windows.entry(key.to_string()).or_insert((window_start, 0));
        if entry.0 != window_start {
            *entry = (window_start, 0);
        }
        entry.1 = entry.1.saturating_add(1);

        Ok(RateLimitResult::from_count(entry.1, config, window_start))
    }

    async fn sweep(&self, config: &RateLimitConfig, now_ms: i64) -> Result<u64, RateLimitError> {
        let current = config.window_start(now_ms);
        let mut windows = self.lock();
        let before = windows.len();
        windows.retain(|_, (start, _)| *start >= current);
        Ok((before - windows.len()) as u64)
    }
}

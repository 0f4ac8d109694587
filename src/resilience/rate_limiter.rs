use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Requests allowed per window, per client key.
    pub limit: u32,
    pub window: Duration,
}

impl RateLimiterConfig {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window: if window.is_zero() {
                Duration::from_secs(1)
            } else {
                window
            },
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(30, Duration::from_secs(60))
    }
}

/// Pass/fail plus the metadata the HTTP layer turns into headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Wall-clock time the current window ends.
    pub reset_at: DateTime<Utc>,
    /// Time until the window ends.
    pub retry_after: Duration,
}

impl RateLimitDecision {
    /// Whole seconds for `Retry-After`, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window limiter keyed by client (usually the IP address).
///
/// Windows of idle clients are pruned lazily once the map grows past
/// `PRUNE_THRESHOLD` entries.
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    state: Mutex<HashMap<String, Window>>,
}

const PRUNE_THRESHOLD: usize = 10_000;

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.cfg
    }

    /// Count one request for `key` and decide whether it may proceed.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let cfg = &self.cfg;
        let now = Instant::now();
        let mut windows = self.state.lock().await;

        if windows.len() > PRUNE_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < cfg.window);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= cfg.window {
            window.started = now;
            window.count = 0;
        }

        let allowed = window.count < cfg.limit;
        if allowed {
            window.count += 1;
        }

        let retry_after = cfg.window.saturating_sub(now.duration_since(window.started));
        let reset_at = Utc::now()
            + chrono::Duration::from_std(retry_after).unwrap_or_else(|_| chrono::Duration::zero());

        RateLimitDecision {
            allowed,
            limit: cfg.limit,
            remaining: cfg.limit.saturating_sub(window.count),
            reset_at,
            retry_after,
        }
    }
}

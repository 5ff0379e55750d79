//! Rate limiting port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Rate limiter trait - abstraction over rate limiting backends.
///
/// Counters are fixed-window per key: the first request inside a window
/// starts it, the window resets only once its deadline has passed.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether a request identified by `key` is admitted under `policy`,
    /// updating the counter. Always yields a decision; `Err` is reserved for
    /// backends that can actually fail.
    async fn check(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError>;

    /// Drop entries whose window has already passed. Returns the number of
    /// entries removed. Purely a memory bound - expiry is re-checked on every
    /// `check` regardless.
    async fn sweep(&self) -> usize;
}

/// A rate limiting policy: at most `max_requests` per `window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        debug_assert!(max_requests > 0);
        debug_assert!(!window.is_zero());
        Self {
            max_requests,
            window,
        }
    }

    /// 10 requests per minute - sensitive endpoints.
    pub fn strict() -> Self {
        Self::new(10, Duration::from_secs(60))
    }

    /// 30 requests per minute - admin write routes.
    pub fn moderate() -> Self {
        Self::new(30, Duration::from_secs(60))
    }

    /// 100 requests per minute - general traffic.
    pub fn generous() -> Self {
        Self::new(100, Duration::from_secs(60))
    }

    /// 5 requests per 15 minutes - login endpoint.
    pub fn login() -> Self {
        Self::new(5, Duration::from_secs(15 * 60))
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::moderate()
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// The policy ceiling the decision was made against.
    pub limit: u32,
    /// Requests left in the current window (0 when denied).
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
    /// Wall-clock instant at which the window resets.
    pub reset_at: DateTime<Utc>,
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}

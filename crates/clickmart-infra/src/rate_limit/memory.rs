//! In-memory fixed-window rate limiter.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tokio::sync::Mutex;

use clickmart_core::ports::{RateLimitDecision, RateLimitError, RateLimitPolicy, RateLimiter};

/// Per-key counter. The window deadline is fixed at the first request and
/// only moves when a check arrives after it has passed.
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// In-memory rate limiter keyed by client identity.
///
/// State lives for the process lifetime and is never persisted. Each process
/// instance keeps independent counters, so horizontal scaling multiplies the
/// effective limit by the instance count - a known limitation of this
/// backend, acceptable for a best-effort throttle.
pub struct InMemoryRateLimiter {
    windows: Mutex<HashMap<String, WindowEntry>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn decision(allowed: bool, policy: &RateLimitPolicy, reset_after: std::time::Duration, remaining: u32) -> RateLimitDecision {
        let reset_delta = TimeDelta::from_std(reset_after).unwrap_or_else(|_| TimeDelta::zero());
        RateLimitDecision {
            allowed,
            limit: policy.max_requests,
            remaining,
            reset_after,
            reset_at: Utc::now() + reset_delta,
        }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        match windows.get_mut(key) {
            Some(entry) if now < entry.reset_at => {
                entry.count += 1;
                let reset_after = entry.reset_at - now;
                if entry.count > policy.max_requests {
                    // Over the limit. The entry keeps its over-limit count;
                    // it is replaced wholesale once the window passes.
                    Ok(Self::decision(false, policy, reset_after, 0))
                } else {
                    let remaining = policy.max_requests - entry.count;
                    Ok(Self::decision(true, policy, reset_after, remaining))
                }
            }
            _ => {
                // First request from this key, or the stored window expired.
                windows.insert(
                    key.to_string(),
                    WindowEntry {
                        count: 1,
                        reset_at: now + policy.window,
                    },
                );
                Ok(Self::decision(
                    true,
                    policy,
                    policy.window,
                    policy.max_requests.saturating_sub(1),
                ))
            }
        }
    }

    async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, entry| now < entry.reset_at);
        before - windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn tiny_policy(max: u32, window_ms: u64) -> RateLimitPolicy {
        RateLimitPolicy::new(max, Duration::from_millis(window_ms))
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_denies() {
        let limiter = InMemoryRateLimiter::new();
        let policy = tiny_policy(3, 60_000);

        for expected_remaining in [2, 1, 0] {
            let d = limiter.check("10.0.0.1", &policy).await.unwrap();
            assert!(d.allowed);
            assert_eq!(d.remaining, expected_remaining);
            assert_eq!(d.limit, 3);
        }

        let d = limiter.check("10.0.0.1", &policy).await.unwrap();
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);

        // Still denied - no rollback of the over-limit count.
        let d = limiter.check("10.0.0.1", &policy).await.unwrap();
        assert!(!d.allowed);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = InMemoryRateLimiter::new();
        let policy = tiny_policy(1, 60_000);

        assert!(limiter.check("a", &policy).await.unwrap().allowed);
        assert!(!limiter.check("a", &policy).await.unwrap().allowed);
        assert!(limiter.check("b", &policy).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn window_expiry_starts_a_fresh_count() {
        let limiter = InMemoryRateLimiter::new();
        let policy = tiny_policy(2, 50);

        assert!(limiter.check("ip", &policy).await.unwrap().allowed);
        assert!(limiter.check("ip", &policy).await.unwrap().allowed);
        assert!(!limiter.check("ip", &policy).await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let d = limiter.check("ip", &policy).await.unwrap();
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
    }

    #[tokio::test]
    async fn sweep_drops_only_expired_windows() {
        let limiter = InMemoryRateLimiter::new();
        let short = tiny_policy(5, 30);
        let long = tiny_policy(5, 60_000);

        limiter.check("short-lived", &short).await.unwrap();
        limiter.check("long-lived", &long).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(limiter.sweep().await, 1);
        // The surviving entry still counts from its old window.
        let d = limiter.check("long-lived", &long).await.unwrap();
        assert_eq!(d.remaining, 3);
    }

    #[tokio::test]
    async fn concurrent_checks_admit_at_most_the_limit() {
        let limiter = Arc::new(InMemoryRateLimiter::new());
        let policy = tiny_policy(5, 60_000);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            let policy = policy.clone();
            handles.push(tokio::spawn(async move {
                limiter.check("burst", &policy).await.unwrap().allowed
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        // One extra admission is tolerated under racing checks.
        assert!(admitted >= 5 && admitted <= 6, "admitted {admitted}");
    }
}

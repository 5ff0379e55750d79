//! In-memory login lockout guard.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use clickmart_core::ports::{LoginAdmission, LoginFailure, LoginGuard};

/// Login guard configuration.
#[derive(Debug, Clone)]
pub struct LoginGuardConfig {
    /// Failures before an IP is locked out.
    pub max_attempts: u32,
    /// How long a lockout lasts, measured from the last failed attempt.
    pub lockout: Duration,
}

impl Default for LoginGuardConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: Duration::from_secs(15 * 60),
        }
    }
}

impl LoginGuardConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: std::env::var("LOGIN_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
            lockout: std::env::var("LOGIN_LOCKOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.lockout),
        }
    }
}

/// Per-IP failure record. Deleted on success or once the lockout window has
/// elapsed since the last attempt.
struct AttemptEntry {
    count: u32,
    last_attempt: DateTime<Utc>,
}

/// In-memory login lockout guard keyed by client IP.
///
/// An IP is locked out iff `count >= max_attempts` and less than `lockout`
/// has passed since its last failed attempt. Expiry is checked lazily on
/// every admission check; `sweep` only bounds memory.
pub struct InMemoryLoginGuard {
    attempts: Mutex<HashMap<String, AttemptEntry>>,
    max_attempts: u32,
    lockout: TimeDelta,
}

impl InMemoryLoginGuard {
    pub fn new(config: LoginGuardConfig) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            max_attempts: config.max_attempts,
            lockout: TimeDelta::from_std(config.lockout).unwrap_or_else(|_| TimeDelta::minutes(15)),
        }
    }

    pub fn from_env() -> Self {
        Self::new(LoginGuardConfig::from_env())
    }
}

#[async_trait]
impl LoginGuard for InMemoryLoginGuard {
    async fn check_admission(&self, ip: &str) -> LoginAdmission {
        let now = Utc::now();
        let mut attempts = self.attempts.lock().await;

        let Some(entry) = attempts.get(ip) else {
            return LoginAdmission::Allowed {
                remaining_attempts: None,
            };
        };

        if now - entry.last_attempt > self.lockout {
            // Lockout window elapsed - back to a clean slate.
            attempts.remove(ip);
            return LoginAdmission::Allowed {
                remaining_attempts: None,
            };
        }

        if entry.count >= self.max_attempts {
            LoginAdmission::Locked {
                until: entry.last_attempt + self.lockout,
            }
        } else {
            LoginAdmission::Allowed {
                remaining_attempts: Some(self.max_attempts - entry.count),
            }
        }
    }

    async fn record_failure(&self, ip: &str) -> LoginFailure {
        let now = Utc::now();
        let mut attempts = self.attempts.lock().await;

        let entry = attempts.entry(ip.to_string()).or_insert(AttemptEntry {
            count: 0,
            last_attempt: now,
        });
        entry.count += 1;
        entry.last_attempt = now;

        let locked_until = (entry.count >= self.max_attempts).then(|| now + self.lockout);

        LoginFailure {
            attempts: entry.count,
            remaining_attempts: self.max_attempts.saturating_sub(entry.count),
            locked_until,
        }
    }

    async fn clear(&self, ip: &str) {
        self.attempts.lock().await.remove(ip);
    }

    async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut attempts = self.attempts.lock().await;
        let before = attempts.len();
        attempts.retain(|_, entry| now - entry.last_attempt <= self.lockout);
        before - attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IP: &str = "203.0.113.7";

    fn guard(max_attempts: u32, lockout: Duration) -> InMemoryLoginGuard {
        InMemoryLoginGuard::new(LoginGuardConfig {
            max_attempts,
            lockout,
        })
    }

    #[tokio::test]
    async fn unknown_ip_is_admitted_without_a_record() {
        let guard = guard(5, Duration::from_secs(900));
        assert_eq!(
            guard.check_admission(IP).await,
            LoginAdmission::Allowed {
                remaining_attempts: None
            }
        );
    }

    #[tokio::test]
    async fn fifth_failure_locks_the_ip() {
        let guard = guard(5, Duration::from_secs(900));

        for i in 1..=4 {
            let failure = guard.record_failure(IP).await;
            assert_eq!(failure.attempts, i);
            assert_eq!(failure.remaining_attempts, 5 - i);
            assert!(failure.locked_until.is_none());
        }

        let before = Utc::now();
        let failure = guard.record_failure(IP).await;
        assert_eq!(failure.attempts, 5);
        let until = failure.locked_until.expect("fifth failure must lock");

        // Lockout end is measured from the fifth failure.
        let expected = before + TimeDelta::seconds(900);
        assert!((until - expected).abs() < TimeDelta::seconds(2));

        match guard.check_admission(IP).await {
            LoginAdmission::Locked { until: reported } => assert_eq!(reported, until),
            other => panic!("expected lockout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remaining_attempts_count_down() {
        let guard = guard(5, Duration::from_secs(900));

        guard.record_failure(IP).await;
        guard.record_failure(IP).await;

        assert_eq!(
            guard.check_admission(IP).await,
            LoginAdmission::Allowed {
                remaining_attempts: Some(3)
            }
        );
    }

    #[tokio::test]
    async fn success_clears_the_record() {
        let guard = guard(5, Duration::from_secs(900));

        for _ in 0..5 {
            guard.record_failure(IP).await;
        }
        assert!(!guard.check_admission(IP).await.is_allowed());

        guard.clear(IP).await;
        assert!(guard.check_admission(IP).await.is_allowed());

        // Next failure starts a fresh count at 1.
        assert_eq!(guard.record_failure(IP).await.attempts, 1);
    }

    #[tokio::test]
    async fn lockout_expires_on_its_own() {
        let guard = guard(2, Duration::from_millis(40));

        guard.record_failure(IP).await;
        guard.record_failure(IP).await;
        assert!(!guard.check_admission(IP).await.is_allowed());

        tokio::time::sleep(Duration::from_millis(70)).await;

        assert_eq!(
            guard.check_admission(IP).await,
            LoginAdmission::Allowed {
                remaining_attempts: None
            }
        );
        assert_eq!(guard.record_failure(IP).await.attempts, 1);
    }

    #[tokio::test]
    async fn sweep_removes_stale_records() {
        let guard = guard(5, Duration::from_millis(40));

        guard.record_failure("198.51.100.1").await;
        guard.record_failure("198.51.100.2").await;

        tokio::time::sleep(Duration::from_millis(70)).await;
        guard.record_failure("198.51.100.3").await;

        assert_eq!(guard.sweep().await, 2);
        // The fresh record survives the sweep.
        assert_eq!(
            guard.check_admission("198.51.100.3").await,
            LoginAdmission::Allowed {
                remaining_attempts: Some(4)
            }
        );
    }
}

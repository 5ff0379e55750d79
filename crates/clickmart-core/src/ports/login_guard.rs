//! Login lockout port - brute-force protection independent of the generic
//! rate limiter.
//!
//! Each client identity (IP) moves through a small state machine:
//! no record -> tracking failures -> locked once the failure ceiling is hit,
//! then back to no record on success or once the lockout window elapses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of an admission check against the lockout table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAdmission {
    /// The identity may attempt a login. `remaining_attempts` is `None` when
    /// no failures are on record.
    Allowed { remaining_attempts: Option<u32> },
    /// The identity is locked out until the given instant.
    Locked { until: DateTime<Utc> },
}

impl LoginAdmission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, LoginAdmission::Allowed { .. })
    }
}

/// Outcome of recording a failed attempt.
#[derive(Debug, Clone)]
pub struct LoginFailure {
    /// Failure count after this attempt.
    pub attempts: u32,
    /// Attempts left before lockout (0 once locked).
    pub remaining_attempts: u32,
    /// Set iff this failure tripped the lockout.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Login lockout guard trait.
#[async_trait]
pub trait LoginGuard: Send + Sync {
    /// Check whether `ip` may attempt a login. Expired entries are deleted
    /// lazily here, so a stale lockout never outlives its window.
    async fn check_admission(&self, ip: &str) -> LoginAdmission;

    /// Record a failed attempt for `ip`, refreshing its last-attempt time.
    async fn record_failure(&self, ip: &str) -> LoginFailure;

    /// Forget all failures for `ip`. Called on successful authentication.
    async fn clear(&self, ip: &str);

    /// Drop entries whose lockout window has fully elapsed. Returns the
    /// number of entries removed.
    async fn sweep(&self) -> usize;
}

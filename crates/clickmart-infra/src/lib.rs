//! # Clickmart Infrastructure
//!
//! Concrete implementations of the ports defined in `clickmart-core`.
//! This crate contains the admission-control state tables, authentication
//! services and the database integration.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL catalog support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `admission` - In-memory rate limiter and login lockout guard

pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "admission")]
pub mod login_guard;
#[cfg(feature = "admission")]
pub mod rate_limit;

pub use database::DatabaseConnections;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtTokenService};

#[cfg(feature = "admission")]
pub use login_guard::{InMemoryLoginGuard, LoginGuardConfig};
#[cfg(feature = "admission")]
pub use rate_limit::InMemoryRateLimiter;

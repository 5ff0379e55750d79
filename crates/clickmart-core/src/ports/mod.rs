//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod login_guard;
mod rate_limit;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use login_guard::{LoginAdmission, LoginFailure, LoginGuard};
pub use rate_limit::{RateLimitDecision, RateLimitError, RateLimitPolicy, RateLimiter};
pub use repository::{BaseRepository, CategoryRepository, ProductRepository, UserRepository};

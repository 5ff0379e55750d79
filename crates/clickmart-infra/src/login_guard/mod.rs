//! Login lockout implementations.

mod memory;

pub use memory::{InMemoryLoginGuard, LoginGuardConfig};

//! Test-automation bypass for admission control.
//!
//! This module only exists in builds carrying the `test-bypass` cargo
//! feature; production builds are made without it, so the code path is absent
//! from the shipped binary. Even when compiled in, a production runtime never
//! honors the signal.

use actix_web::http::header::HeaderMap;

use crate::config::Environment;

/// Header carrying the pre-shared bypass token.
pub static BYPASS_HEADER: &str = "x-guard-bypass";

/// Environment variable holding the expected token. No default exists;
/// without it the bypass stays inert.
pub static BYPASS_TOKEN_VAR: &str = "GUARD_BYPASS_TOKEN";

/// True iff the request presents the pre-shared token and the runtime is not
/// production. Callers skip both admission checks and failure recording.
pub fn admission_bypassed(headers: &HeaderMap, environment: Environment) -> bool {
    if environment.is_production() {
        return false;
    }

    let Ok(expected) = std::env::var(BYPASS_TOKEN_VAR) else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    headers
        .get(BYPASS_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|presented| presented == expected)
}

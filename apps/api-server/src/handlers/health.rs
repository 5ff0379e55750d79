//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Which catalog backend the process is serving from. An in-memory
    /// catalog on a postgres build means the configured database was
    /// unreachable at startup.
    pub catalog: &'static str,
    pub timestamp: String,
}

fn catalog_mode(state: &AppState) -> &'static str {
    #[cfg(feature = "postgres")]
    if state.db.is_some() {
        return "postgres";
    }

    let _ = state;
    "in-memory"
}

/// Health check endpoint - returns server status and the active catalog mode.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        catalog: catalog_mode(&state),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    HttpResponse::Ok().json(response)
}

//! # Clickmart API Server
//!
//! The main entry point for the Actix-web HTTP server: affiliate redirects,
//! login with lockout, and the rate-limited back-office catalog routes.

use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;

use clickmart_core::ports::{PasswordService, TokenService};
use clickmart_infra::auth::{Argon2PasswordService, JwtTokenService};
use config::AppConfig;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env();

    #[cfg(feature = "test-bypass")]
    if config.environment.is_production() {
        tracing::error!(
            "Built with the test-bypass feature but running in production; bypass signals will be ignored. Rebuild without the feature."
        );
    }

    tracing::info!(
        "Starting Clickmart API server on {}:{}",
        config.host,
        config.port
    );

    // Build application state
    let state = AppState::new(&config).await;

    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    // The sweeper handle must stay alive for the jobs to keep firing.
    #[cfg(feature = "scheduler")]
    let _sweeper = start_sweeper(&config, &state).await;

    // Start HTTP server
    let server_state = state.clone();
    HttpServer::new(move || {
        let state = server_state.clone();
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .configure(move |cfg| handlers::configure_routes(cfg, &state))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

/// Register and start the periodic admission-table sweep.
#[cfg(feature = "scheduler")]
async fn start_sweeper(config: &AppConfig, state: &AppState) -> Option<background::Scheduler> {
    use background::{Scheduler, SchedulerConfig};

    let scheduler = match Scheduler::new(SchedulerConfig::from_env()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create scheduler; admission tables will not be swept");
            return None;
        }
    };

    let limiter = state.limiter.clone();
    let guard = state.guard.clone();
    let registered = scheduler
        .add_cron(&config.sweep_cron, move || {
            let limiter = limiter.clone();
            let guard = guard.clone();
            async move {
                let windows = limiter.sweep().await;
                let lockouts = guard.sweep().await;
                tracing::debug!(windows, lockouts, "Swept expired admission-control entries");
            }
        })
        .await;

    if let Err(e) = registered {
        tracing::error!(error = %e, "Failed to register sweep job");
        return None;
    }

    if let Err(e) = scheduler.start().await {
        tracing::error!(error = %e, "Failed to start scheduler");
        return None;
    }

    Some(scheduler)
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_server=debug,clickmart_infra=debug"));

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

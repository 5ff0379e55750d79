//! HTTP handlers and route configuration.

mod auth;
mod catalog;
mod health;
mod redirect;

use actix_web::web;

use clickmart_core::ports::RateLimitPolicy;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
///
/// Write routes live under `/api/admin` behind the moderate policy; the
/// login resource gets the stricter login policy on top of the lockout
/// guard. The visitor-facing redirect stays outside `/api`.
///
/// The login limiter and the lockout guard overlap on purpose: the limiter
/// caps raw POST volume per window, the guard tracks failed credentials
/// across windows. With both budgets at 5, a rapid burst exhausts the
/// window first and gets the limiter's generic 429; the guard's richer
/// body (`lockout_ends_at`, `remaining_attempts`) shows when attempts are
/// spread out. Either way nothing past the fifth failure reaches
/// credential checking.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    let login_limit = RateLimitMiddleware::new(
        state.limiter.clone(),
        RateLimitPolicy::login(),
        state.environment,
    );
    let write_limit = RateLimitMiddleware::new(
        state.limiter.clone(),
        RateLimitPolicy::moderate(),
        state.environment,
    );

    cfg.route(
        "/products/{id}/go",
        web::get().to(redirect::go_to_product),
    )
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/products", web::get().to(catalog::list_products))
            .route("/products/{id}", web::get().to(catalog::get_product))
            .route("/categories", web::get().to(catalog::list_categories))
            // Auth routes
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(login_limit)
                            .route(web::post().to(auth::login)),
                    )
                    .route("/register", web::post().to(auth::register))
                    .route("/me", web::get().to(auth::me)),
            )
            // Back-office write routes
            .service(
                web::scope("/admin")
                    .wrap(write_limit)
                    .route("/products", web::post().to(catalog::create_product))
                    .route("/products/{id}", web::put().to(catalog::update_product))
                    .route("/products/{id}", web::delete().to(catalog::delete_product))
                    .route("/categories", web::post().to(catalog::create_category))
                    .route("/categories/{id}", web::delete().to(catalog::delete_category)),
            ),
    );
}

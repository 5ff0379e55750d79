//! Authentication handlers.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;

use clickmart_core::domain::User;
use clickmart_core::ports::{LoginAdmission, PasswordService, TokenService};
use clickmart_shared::dto::{LoginRequest, LoginResponse, RegisterRequest, UserResponse, UserSummary};

use crate::middleware::auth::{Identity, SESSION_COOKIE};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

fn session_cookie<'a>(token: String, state: &AppState, max_age_secs: i64) -> Cookie<'a> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(state.environment.is_production())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

/// POST /api/auth/login
///
/// Admission runs before any credential work: a locked-out IP is refused even
/// with correct credentials. Failures are recorded per IP; success wipes the
/// record.
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let payload = body.into_inner();

    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if payload.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    let ip = client_ip(&req);

    #[cfg(feature = "test-bypass")]
    let bypassed = crate::middleware::bypass::admission_bypassed(req.headers(), state.environment);
    #[cfg(not(feature = "test-bypass"))]
    let bypassed = false;

    if !bypassed {
        if let LoginAdmission::Locked { until } = state.guard.check_admission(&ip).await {
            tracing::warn!(client = %ip, %until, "Login attempt from locked-out IP");
            return Err(AppError::LockedOut { until });
        }
    }

    let user = state.users.find_by_email(&payload.email).await?;

    let verified = match &user {
        Some(u) => password_service
            .verify(&payload.password, &u.password_hash)
            .map_err(|e| AppError::Internal(e.to_string()))?,
        // Unknown email counts as a failed attempt too.
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        if bypassed {
            return Err(AppError::InvalidCredentials {
                remaining_attempts: None,
            });
        }

        let failure = state.guard.record_failure(&ip).await;
        if let Some(until) = failure.locked_until {
            tracing::warn!(client = %ip, attempts = failure.attempts, %until, "IP locked out");
        }
        return Err(AppError::InvalidCredentials {
            remaining_attempts: Some(failure.remaining_attempts),
        });
    };

    state.guard.clear(&ip).await;

    let token = token_service
        .generate_token(user.id, &user.email, &user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            token,
            &state,
            token_service.expiration_seconds(),
        ))
        .json(LoginResponse {
            success: true,
            user: UserSummary {
                email: user.email,
                role: user.role,
            },
        }))
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let payload = body.into_inner();

    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if state
        .users
        .find_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service
        .hash(&payload.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User::new(payload.email, password_hash, "admin".to_string());
    let saved = state.users.save(user).await?;

    let token = token_service
        .generate_token(saved.id, &saved.email, &saved.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created()
        .cookie(session_cookie(
            token,
            &state,
            token_service.expiration_seconds(),
        ))
        .json(LoginResponse {
            success: true,
            user: UserSummary {
                email: saved.email,
                role: saved.role,
            },
        }))
}

/// GET /api/auth/me - Protected route
pub async fn me(identity: Identity) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse {
        id: identity.user_id.to_string(),
        email: identity.email,
        role: identity.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use clickmart_core::ports::{BaseRepository, LoginGuard, RateLimiter};
    use clickmart_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
    use clickmart_infra::login_guard::{InMemoryLoginGuard, LoginGuardConfig};
    use clickmart_infra::rate_limit::InMemoryRateLimiter;
    use std::time::Duration;

    use crate::config::Environment;
    use crate::state::{InMemoryCategoryRepository, InMemoryProductRepository, InMemoryUserRepository};

    const EMAIL: &str = "admin@clickmart.test";
    const PASSWORD: &str = "correct-horse-battery";

    async fn test_state() -> AppState {
        let users = Arc::new(InMemoryUserRepository::new());
        let password_service = Argon2PasswordService::new();
        let hash = password_service.hash(PASSWORD).unwrap();
        users
            .save(User::new(EMAIL.to_string(), hash, "admin".to_string()))
            .await
            .unwrap();

        AppState {
            users,
            products: Arc::new(InMemoryProductRepository::new()),
            categories: Arc::new(InMemoryCategoryRepository::new()),
            limiter: Arc::new(InMemoryRateLimiter::new()) as Arc<dyn RateLimiter>,
            guard: Arc::new(InMemoryLoginGuard::new(LoginGuardConfig {
                max_attempts: 5,
                lockout: Duration::from_secs(900),
            })) as Arc<dyn LoginGuard>,
            environment: Environment::Development,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    async fn test_app(
        state: AppState,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    > {
        let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "test".to_string(),
        }));
        let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(token_service))
                .app_data(web::Data::new(password_service))
                .route("/api/auth/login", web::post().to(login)),
        )
        .await
    }

    fn login_request(email: &str, password: &str) -> actix_http::Request {
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .to_request()
    }

    #[actix_web::test]
    async fn good_credentials_set_a_session_cookie() {
        let app = test_app(test_state().await).await;

        let resp = test::call_service(&app, login_request(EMAIL, PASSWORD)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let cookie_set = resp
            .headers()
            .get_all(actix_web::http::header::SET_COOKIE)
            .any(|v| v.to_str().unwrap().starts_with("session="));
        assert!(cookie_set);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], EMAIL);
        assert_eq!(body["user"]["role"], "admin");
    }

    #[actix_web::test]
    async fn bad_credentials_report_remaining_attempts() {
        let app = test_app(test_state().await).await;

        let resp = test::call_service(&app, login_request(EMAIL, "wrong")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["remaining_attempts"], 4);
    }

    #[actix_web::test]
    async fn sixth_attempt_is_locked_out_even_with_good_credentials() {
        let app = test_app(test_state().await).await;

        for _ in 0..5 {
            let resp = test::call_service(&app, login_request(EMAIL, "wrong")).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }

        let resp = test::call_service(&app, login_request(EMAIL, PASSWORD)).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("retry-after"));

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["lockout_ends_at"].is_string());
    }

    #[actix_web::test]
    async fn success_resets_the_failure_count() {
        let app = test_app(test_state().await).await;

        for _ in 0..2 {
            test::call_service(&app, login_request(EMAIL, "wrong")).await;
        }

        let resp = test::call_service(&app, login_request(EMAIL, PASSWORD)).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // A fresh count: first failure after success leaves 4 attempts.
        let resp = test::call_service(&app, login_request(EMAIL, "wrong")).await;
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["remaining_attempts"], 4);
    }

    #[actix_web::test]
    async fn malformed_input_is_rejected_before_admission() {
        let app = test_app(test_state().await).await;

        let resp = test::call_service(&app, login_request("not-an-email", "pw")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(&app, login_request(EMAIL, "")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

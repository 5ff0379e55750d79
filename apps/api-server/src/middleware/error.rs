//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use chrono::{DateTime, Utc};
use clickmart_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    /// Bad credentials on login. Carries how many attempts remain before the
    /// lockout trips (None when the guard was bypassed).
    InvalidCredentials {
        remaining_attempts: Option<u32>,
    },
    Forbidden,
    Conflict(String),
    /// The client IP is locked out of login until the given instant.
    LockedOut {
        until: DateTime<Utc>,
    },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::InvalidCredentials { .. } => write!(f, "Invalid credentials"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::LockedOut { until } => write!(f, "Locked out until {}", until),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::LockedOut { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(detail) => {
                HttpResponse::NotFound().json(ErrorResponse::not_found(detail))
            }
            AppError::BadRequest(detail) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(detail))
            }
            AppError::Unauthorized => {
                HttpResponse::Unauthorized().json(ErrorResponse::unauthorized())
            }
            AppError::InvalidCredentials { remaining_attempts } => {
                let mut body =
                    ErrorResponse::unauthorized().with_detail("Invalid email or password");
                if let Some(remaining) = remaining_attempts {
                    body = body.with_remaining_attempts(*remaining);
                }
                HttpResponse::Unauthorized().json(body)
            }
            AppError::Forbidden => HttpResponse::Forbidden().json(ErrorResponse::forbidden()),
            AppError::Conflict(detail) => HttpResponse::Conflict()
                .json(ErrorResponse::new(409, "Conflict").with_detail(detail)),
            AppError::LockedOut { until } => {
                let retry_after = (*until - Utc::now()).num_seconds().max(0) as u64;
                HttpResponse::TooManyRequests()
                    .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                    .json(
                        ErrorResponse::too_many_requests()
                            .with_detail("Too many failed login attempts")
                            .with_lockout_ends_at(until.to_rfc3339())
                            .with_retry_after(retry_after),
                    )
            }
            AppError::Internal(detail) => {
                // Full detail goes to the logs, not the caller.
                tracing::error!("Internal error: {}", detail);
                HttpResponse::InternalServerError().json(ErrorResponse::internal_error())
            }
        }
    }
}

// Conversion from domain errors
impl From<clickmart_core::error::DomainError> for AppError {
    fn from(err: clickmart_core::error::DomainError) -> Self {
        match err {
            clickmart_core::error::DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            clickmart_core::error::DomainError::Validation(msg) => AppError::BadRequest(msg),
            clickmart_core::error::DomainError::Duplicate(msg) => AppError::Conflict(msg),
            clickmart_core::error::DomainError::Unauthorized => AppError::Unauthorized,
            clickmart_core::error::DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<clickmart_core::error::RepoError> for AppError {
    fn from(err: clickmart_core::error::RepoError) -> Self {
        match err {
            clickmart_core::error::RepoError::NotFound => {
                AppError::NotFound("Resource not found".to_string())
            }
            clickmart_core::error::RepoError::Constraint(msg) => AppError::Conflict(msg),
            clickmart_core::error::RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            clickmart_core::error::RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

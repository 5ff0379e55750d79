//! Rate limiting middleware.
//!
//! Wraps a scope or resource with a fixed-window policy keyed by client IP.
//! Denied requests short-circuit to a 429 before the inner service runs.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use clickmart_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use clickmart_core::ports::{RateLimitPolicy, RateLimiter};

use crate::config::Environment;

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
    policy: RateLimitPolicy,
    #[cfg(feature = "test-bypass")]
    environment: Environment,
}

impl RateLimitMiddleware {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        policy: RateLimitPolicy,
        environment: Environment,
    ) -> Self {
        #[cfg(not(feature = "test-bypass"))]
        let _ = environment;

        Self {
            limiter,
            policy,
            #[cfg(feature = "test-bypass")]
            environment,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            policy: self.policy.clone(),
            #[cfg(feature = "test-bypass")]
            environment: self.environment,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    policy: RateLimitPolicy,
    #[cfg(feature = "test-bypass")]
    environment: Environment,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();
        let policy = self.policy.clone();

        #[cfg(feature = "test-bypass")]
        if crate::middleware::bypass::admission_bypassed(req.headers(), self.environment) {
            tracing::debug!("Admission control bypassed for test automation");
            return Box::pin(
                async move { service.call(req).await.map(|res| res.map_into_left_body()) },
            );
        }

        // Client identity: real IP where a proxy forwards it, peer address
        // otherwise.
        let key = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();

        Box::pin(async move {
            match limiter.check(&key, &policy).await {
                Ok(decision) if !decision.allowed => {
                    tracing::warn!(client = %key, limit = decision.limit, "Rate limit exceeded");

                    let retry_after = decision.reset_after.as_secs().max(1);
                    let error = ErrorResponse::too_many_requests()
                        .with_detail(format!(
                            "Rate limit exceeded. Try again in {} seconds.",
                            retry_after
                        ))
                        .with_retry_after(retry_after);

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Limit", decision.limit.to_string()))
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                        .json(error);

                    let (http_req, _payload) = req.into_parts();
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
                Ok(_) => service.call(req).await.map(|res| res.map_into_left_body()),
                Err(e) => {
                    // Admission is best-effort; a broken limiter fails open.
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                    service.call(req).await.map(|res| res.map_into_left_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use clickmart_infra::rate_limit::InMemoryRateLimiter;
    use std::time::Duration;

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn denies_after_the_window_fills() {
        let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new());
        let policy = RateLimitPolicy::new(2, Duration::from_secs(60));

        let app = test::init_service(
            App::new().service(
                web::resource("/guarded")
                    .wrap(RateLimitMiddleware::new(
                        limiter,
                        policy,
                        Environment::Development,
                    ))
                    .route(web::get().to(ok_handler)),
            ),
        )
        .await;

        for _ in 0..2 {
            let resp =
                test::call_service(&app, test::TestRequest::get().uri("/guarded").to_request())
                    .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/guarded").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("retry-after"));
        assert_eq!(
            resp.headers().get("x-ratelimit-remaining").unwrap(),
            &"0".to_string()
        );
    }
}

//! Affiliate redirect and click tracking.

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /products/{id}/go
///
/// Resolves the product's affiliate destination and redirects the visitor.
/// The click-counter update is best-effort: its failure is logged and
/// swallowed, never shown to the visitor. Only a failed lookup (before the
/// destination is known) aborts the redirect.
pub async fn go_to_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    // Awaited so the click usually lands before the 302, but never gates it.
    if let Err(e) = state.products.increment_clicks(id).await {
        tracing::warn!(product_id = %id, error = %e, "Click counter update failed, redirecting anyway");
    } else {
        tracing::debug!(product_id = %id, "Click recorded");
    }

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, product.affiliate_url))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use clickmart_core::domain::Product;
    use clickmart_core::error::RepoError;
    use clickmart_core::ports::{BaseRepository, LoginGuard, ProductRepository, RateLimiter};
    use clickmart_infra::login_guard::{InMemoryLoginGuard, LoginGuardConfig};
    use clickmart_infra::rate_limit::InMemoryRateLimiter;

    use crate::config::Environment;
    use crate::state::{InMemoryCategoryRepository, InMemoryProductRepository, InMemoryUserRepository};

    /// Repository double whose click increments always fail, counting how
    /// often one was attempted.
    struct BrokenCounterRepository {
        inner: InMemoryProductRepository,
        increment_attempts: AtomicUsize,
    }

    impl BrokenCounterRepository {
        fn new() -> Self {
            Self {
                inner: InMemoryProductRepository::new(),
                increment_attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BaseRepository<Product, Uuid> for BrokenCounterRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
            self.inner.find_by_id(id).await
        }

        async fn save(&self, product: Product) -> Result<Product, RepoError> {
            self.inner.save(product).await
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.inner.delete(id).await
        }
    }

    #[async_trait]
    impl ProductRepository for BrokenCounterRepository {
        async fn list(&self) -> Result<Vec<Product>, RepoError> {
            self.inner.list().await
        }

        async fn increment_clicks(&self, _id: Uuid) -> Result<(), RepoError> {
            self.increment_attempts.fetch_add(1, Ordering::SeqCst);
            Err(RepoError::Connection("storage offline".to_string()))
        }
    }

    fn state_with_products(products: Arc<dyn ProductRepository>) -> AppState {
        AppState {
            users: Arc::new(InMemoryUserRepository::new()),
            products,
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

    async fn seeded_product(repo: &dyn ProductRepository, clicks: i64) -> Product {
        let mut product = Product::new(
            "USB-C Hub".to_string(),
            "https://example.com/x".to_string(),
            None,
        );
        product.click_count = clicks;
        repo.save(product.clone()).await.unwrap();
        product
    }

    #[actix_web::test]
    async fn redirects_and_counts_the_click() {
        let products = Arc::new(InMemoryProductRepository::new());
        let product = seeded_product(products.as_ref(), 3).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_products(products.clone())))
                .route("/products/{id}/go", web::get().to(go_to_product)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/products/{}/go", product.id))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "https://example.com/x"
        );

        let stored = products.find_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(stored.click_count, 4);
    }

    #[actix_web::test]
    async fn counter_failure_does_not_block_the_redirect() {
        let products = Arc::new(BrokenCounterRepository::new());
        let product = seeded_product(&products.inner, 0).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_products(products.clone())))
                .route("/products/{id}/go", web::get().to(go_to_product)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/products/{}/go", product.id))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "https://example.com/x"
        );
        assert_eq!(products.increment_attempts.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn unknown_product_is_a_404_without_redirect_or_count() {
        let products = Arc::new(BrokenCounterRepository::new());

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_products(products.clone())))
                .route("/products/{id}/go", web::get().to(go_to_product)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/products/{}/go", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(resp.headers().get(header::LOCATION).is_none());
        assert_eq!(products.increment_attempts.load(Ordering::SeqCst), 0);
    }
}

//! Catalog handlers - public reads plus the rate-limited back-office writes.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use clickmart_core::domain::{Category, Product};
use clickmart_shared::ApiResponse;
use clickmart_shared::dto::{CategoryRequest, CategoryResponse, ProductRequest, ProductResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn product_response(product: Product) -> ProductResponse {
    ProductResponse {
        id: product.id.to_string(),
        name: product.name,
        affiliate_url: product.affiliate_url,
        click_count: product.click_count,
        category_id: product.category_id.map(|id| id.to_string()),
        created_at: product.created_at.to_rfc3339(),
    }
}

fn category_response(category: Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id.to_string(),
        name: category.name,
        slug: category.slug,
    }
}

fn require_admin(identity: &Identity) -> AppResult<()> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn validate_product(payload: &ProductRequest) -> AppResult<Option<Uuid>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }
    if !payload.affiliate_url.starts_with("http://") && !payload.affiliate_url.starts_with("https://")
    {
        return Err(AppError::BadRequest(
            "Affiliate URL must be an absolute http(s) URL".to_string(),
        ));
    }
    payload
        .category_id
        .as_deref()
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| AppError::BadRequest("Invalid category id".to_string()))
        })
        .transpose()
}

/// GET /api/products
pub async fn list_products(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let products = state.products.list().await?;
    let body: Vec<ProductResponse> = products.into_iter().map(product_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// GET /api/products/{id}
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(product_response(product))))
}

/// GET /api/categories
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.categories.list().await?;
    let body: Vec<CategoryResponse> = categories.into_iter().map(category_response).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(body)))
}

/// POST /api/admin/products
pub async fn create_product(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<ProductRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&identity)?;
    let payload = body.into_inner();
    let category_id = validate_product(&payload)?;

    let product = Product::new(payload.name, payload.affiliate_url, category_id);
    let saved = state.products.save(product).await?;

    tracing::info!(product_id = %saved.id, by = %identity.email, "Product created");
    Ok(HttpResponse::Created().json(ApiResponse::ok(product_response(saved))))
}

/// PUT /api/admin/products/{id}
pub async fn update_product(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProductRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&identity)?;
    let id = path.into_inner();
    let payload = body.into_inner();
    let category_id = validate_product(&payload)?;

    let mut product = state
        .products
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

    product.name = payload.name;
    product.affiliate_url = payload.affiliate_url;
    product.category_id = category_id;
    product.updated_at = chrono::Utc::now();

    let saved = state.products.save(product).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(product_response(saved))))
}

/// DELETE /api/admin/products/{id}
pub async fn delete_product(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_admin(&identity)?;
    let id = path.into_inner();

    state.products.delete(id).await?;

    tracing::info!(product_id = %id, by = %identity.email, "Product deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/admin/categories
pub async fn create_category(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&identity)?;
    let payload = body.into_inner();

    if payload.name.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Category name and slug are required".to_string(),
        ));
    }

    let category = Category::new(payload.name, payload.slug);
    let saved = state.categories.save(category).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(category_response(saved))))
}

/// DELETE /api/admin/categories/{id}
pub async fn delete_category(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    require_admin(&identity)?;
    let id = path.into_inner();

    state.categories.delete(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product entity - a catalog item pointing at an affiliate destination.
///
/// The redirect flow only reads `affiliate_url` and bumps `click_count`;
/// the rest of the lifecycle is managed by the admin CRUD routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    /// Outbound destination on the e-commerce platform (Shopee, Lazada, ...).
    pub affiliate_url: String,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new product with generated ID, zero clicks and fresh timestamps.
    pub fn new(name: String, affiliate_url: String, category_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category_id,
            name,
            affiliate_url,
            click_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

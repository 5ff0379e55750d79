//! Application state - shared across all handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use clickmart_core::domain::{Category, Product, User};
use clickmart_core::error::RepoError;
use clickmart_core::ports::{
    BaseRepository, CategoryRepository, LoginGuard, ProductRepository, RateLimiter, UserRepository,
};
use clickmart_infra::login_guard::InMemoryLoginGuard;
use clickmart_infra::rate_limit::InMemoryRateLimiter;

#[cfg(feature = "postgres")]
use clickmart_infra::database::{
    DatabaseConnections, PostgresCategoryRepository, PostgresProductRepository,
    PostgresUserRepository,
};

use crate::config::{AppConfig, Environment};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    /// Process-wide fixed-window counters for the write routes.
    pub limiter: Arc<dyn RateLimiter>,
    /// Process-wide login lockout table.
    pub guard: Arc<dyn LoginGuard>,
    pub environment: Environment,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new());
        let guard: Arc<dyn LoginGuard> = Arc::new(InMemoryLoginGuard::from_env());

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => {
                        let conn = Arc::new(connections);
                        return Self {
                            users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
                            products: Arc::new(PostgresProductRepository::new(conn.main.clone())),
                            categories: Arc::new(PostgresCategoryRepository::new(
                                conn.main.clone(),
                            )),
                            limiter,
                            guard,
                            environment: config.environment,
                            db: Some(conn),
                        };
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory catalog.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running with an in-memory catalog.");
            }
        }

        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            products: Arc::new(InMemoryProductRepository::new()),
            categories: Arc::new(InMemoryCategoryRepository::new()),
            limiter,
            guard,
            environment: config.environment,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}

// In-memory repositories, used when no database is configured (dev mode) and
// by the handler tests. Data is lost on restart.

pub struct InMemoryUserRepository {
    items: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        self.items.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.items
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

pub struct InMemoryProductRepository {
    items: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl BaseRepository<Product, Uuid> for InMemoryProductRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn save(&self, product: Product) -> Result<Product, RepoError> {
        self.items.write().await.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.items
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepoError> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn increment_clicks(&self, id: Uuid) -> Result<(), RepoError> {
        let mut items = self.items.write().await;
        let product = items.get_mut(&id).ok_or(RepoError::NotFound)?;
        product.click_count += 1;
        Ok(())
    }
}

pub struct InMemoryCategoryRepository {
    items: RwLock<HashMap<Uuid, Category>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        self.items
            .write()
            .await
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.items
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait::async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.items.read().await.values().cloned().collect())
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Product, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Product repository.
#[async_trait]
pub trait ProductRepository: BaseRepository<Product, Uuid> {
    /// List the full catalog.
    async fn list(&self) -> Result<Vec<Product>, RepoError>;

    /// Bump the persisted click counter for a product by one.
    ///
    /// The redirect flow treats this as best-effort: a failure here is logged
    /// by the caller and never surfaced to the visitor.
    async fn increment_clicks(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn list(&self) -> Result<Vec<Category>, RepoError>;
}

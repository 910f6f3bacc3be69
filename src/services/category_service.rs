//! Domain service for categories.
//!
//! Also owns backlink reconciliation: recomputing `Category.products` from
//! the products that actually reference each category.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Requester;
use crate::models::catalog::Category;

/// Errors shared by the category and product services.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

pub const CATEGORY_NOT_FOUND: &str = "category is not found";

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Regenerate the slug from the new name.
    pub update_slug: bool,
}

#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, CatalogError>;

    async fn get(&self, slug: &str) -> Result<Category, CatalogError>;

    async fn create(
        &self,
        requester: &Requester,
        input: CategoryInput,
    ) -> Result<Category, CatalogError>;

    async fn update(
        &self,
        requester: &Requester,
        slug: &str,
        update: CategoryUpdate,
    ) -> Result<Category, CatalogError>;

    /// Returns the category as it was before deletion.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when no category has `slug`.
    async fn delete(&self, requester: &Requester, slug: &str) -> Result<Category, CatalogError>;

    /// Rewrites one category's product list from the products table.
    /// Returns whether the stored list had drifted.
    async fn reconcile(&self, category_id: &str) -> Result<bool, CatalogError>;

    /// Reconciles every category. Returns how many had drifted.
    async fn reconcile_all(&self) -> Result<usize, CatalogError>;
}

//! Domain service for products.
//!
//! Product writes are acknowledged before the owning category's backlinks
//! are updated; see [`crate::services::propagation`].

use async_trait::async_trait;

use crate::auth::Requester;
use crate::domain::{Page, PageRequest};
use crate::models::catalog::{Product, ProductView};
use crate::services::category_service::CatalogError;

pub const PRODUCT_NOT_FOUND: &str = "product is not found";

#[derive(Debug, Clone)]
pub struct ProductInput {
    pub category: String,
    pub title: String,
    pub price: i64,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub category: Option<String>,
    pub title: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    /// Regenerate the slug from the new title.
    pub update_slug: bool,
}

#[async_trait]
pub trait ProductService: Send + Sync {
    /// One page of products joined with category and creator summaries.
    async fn list(&self, page: PageRequest) -> Result<Page<ProductView>, CatalogError>;

    async fn get(&self, slug: &str) -> Result<ProductView, CatalogError>;

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when a privileged requester names a
    /// category that does not exist.
    async fn create(
        &self,
        requester: &Requester,
        input: ProductInput,
    ) -> Result<Product, CatalogError>;

    async fn update(
        &self,
        requester: &Requester,
        slug: &str,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError>;

    /// Returns the product as it was before deletion.
    async fn delete(&self, requester: &Requester, slug: &str) -> Result<Product, CatalogError>;
}

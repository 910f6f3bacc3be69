//! Domain service for carts. Each identity owns at most one cart; anonymous
//! requests share the seeded anonymous user's cart.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Requester;
use crate::models::cart::{Cart, CartLine};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart is not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CartError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CartError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[async_trait]
pub trait CartService: Send + Sync {
    /// The requester's cart, `None` if they never added anything.
    async fn view(&self, requester: &Requester) -> Result<Option<Cart>, CartError>;

    /// Replaces all lines. Duplicate product ids are summed first.
    async fn replace(&self, requester: &Requester, lines: Vec<CartLine>)
    -> Result<Cart, CartError>;

    /// Sets one line's quantity, appending it when absent.
    async fn add(&self, requester: &Requester, line: CartLine) -> Result<Cart, CartError>;

    /// Drops one line. Absent lines are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] when the requester has no cart.
    async fn remove(&self, requester: &Requester, product_id: &str) -> Result<Cart, CartError>;

    async fn list_all(&self) -> Result<Vec<Cart>, CartError>;

    async fn get_for_user(&self, user_id: &str) -> Result<Cart, CartError>;
}

//! `SeaORM` implementation of the `CartService` trait.

use async_trait::async_trait;
use tracing::debug;

use crate::auth::Requester;
use crate::db::Store;
use crate::models::cart::{Cart, CartLine, collapse_lines, remove_line, upsert_line};
use crate::services::cart_service::{CartError, CartService};

pub struct SeaOrmCartService {
    store: Store,
    anonymous_id: String,
}

impl SeaOrmCartService {
    #[must_use]
    pub const fn new(store: Store, anonymous_id: String) -> Self {
        Self {
            store,
            anonymous_id,
        }
    }

    fn owner<'a>(&'a self, requester: &'a Requester) -> &'a str {
        requester.id_or(&self.anonymous_id)
    }
}

#[async_trait]
impl CartService for SeaOrmCartService {
    async fn view(&self, requester: &Requester) -> Result<Option<Cart>, CartError> {
        Ok(self.store.get_cart(self.owner(requester)).await?)
    }

    async fn replace(
        &self,
        requester: &Requester,
        lines: Vec<CartLine>,
    ) -> Result<Cart, CartError> {
        let lines = collapse_lines(lines);
        let user_id = self.owner(requester);
        debug!(user_id, lines = lines.len(), "Replacing cart");

        Ok(self
            .store
            .modify_cart(user_id, |current| current.clone_from(&lines))
            .await?)
    }

    async fn add(&self, requester: &Requester, line: CartLine) -> Result<Cart, CartError> {
        Ok(self
            .store
            .modify_cart(self.owner(requester), |current| {
                upsert_line(current, line.clone());
            })
            .await?)
    }

    async fn remove(&self, requester: &Requester, product_id: &str) -> Result<Cart, CartError> {
        let user_id = self.owner(requester);
        if self.store.get_cart(user_id).await?.is_none() {
            return Err(CartError::NotFound);
        }

        Ok(self
            .store
            .modify_cart(user_id, |current| {
                remove_line(current, product_id);
            })
            .await?)
    }

    async fn list_all(&self) -> Result<Vec<Cart>, CartError> {
        Ok(self.store.list_carts().await?)
    }

    async fn get_for_user(&self, user_id: &str) -> Result<Cart, CartError> {
        self.store.get_cart(user_id).await?.ok_or(CartError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RequesterClaims;
    use crate::domain::Role;

    async fn service() -> SeaOrmCartService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        SeaOrmCartService::new(store, "anon".to_string())
    }

    fn customer(id: &str) -> Requester {
        Requester::authenticated(RequesterClaims {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: format!("{id}@example.com"),
            role: Role::Customer,
        })
    }

    fn line(id: &str, quantity: u16) -> CartLine {
        CartLine {
            product_id: id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_replace_collapses_and_is_idempotent() {
        let service = service().await;
        let ada = customer("ada");

        let lines = vec![line("p1", 2), line("p1", 3)];
        service.replace(&ada, lines.clone()).await.unwrap();
        let cart = service.replace(&ada, lines).await.unwrap();

        assert_eq!(cart.products, vec![line("p1", 5)]);
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_then_remove() {
        let service = service().await;
        let ada = customer("ada");

        service.add(&ada, line("p1", 1)).await.unwrap();
        service.add(&ada, line("p2", 4)).await.unwrap();
        let cart = service.add(&ada, line("p1", 7)).await.unwrap();
        assert_eq!(cart.products, vec![line("p1", 7), line("p2", 4)]);

        let cart = service.remove(&ada, "p1").await.unwrap();
        assert_eq!(cart.products, vec![line("p2", 4)]);

        let cart = service.remove(&ada, "absent").await.unwrap();
        assert_eq!(cart.products, vec![line("p2", 4)]);
    }

    #[tokio::test]
    async fn test_anonymous_uses_fallback_owner() {
        let service = service().await;
        assert!(service.view(&Requester::anonymous()).await.unwrap().is_none());

        service
            .add(&Requester::anonymous(), line("p1", 1))
            .await
            .unwrap();
        let cart = service.get_for_user("anon").await.unwrap();
        assert_eq!(cart.products, vec![line("p1", 1)]);
    }

    #[tokio::test]
    async fn test_remove_without_cart_is_not_found() {
        let service = service().await;
        let err = service.remove(&customer("bob"), "p1").await.unwrap_err();
        assert!(matches!(err, CartError::NotFound));
    }
}

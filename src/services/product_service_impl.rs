//! `SeaORM` implementation of the `ProductService` trait.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

use crate::auth::{Operation, PrivilegeGate, Requester};
use crate::db::{Store, is_duplicate_key, now};
use crate::domain::{Page, PageMetadata, PageRequest, new_id};
use crate::models::catalog::{NewProduct, Product, ProductPatch, ProductView};
use crate::services::category_service::{CATEGORY_NOT_FOUND, CatalogError};
use crate::services::product_service::{
    PRODUCT_NOT_FOUND, ProductInput, ProductService, ProductUpdate,
};
use crate::services::propagation::{BacklinkEvent, ConsistencyCoordinator};
use crate::services::slug;

const SLUG_TAKEN: &str = "product slug is already in use";

pub struct SeaOrmProductService {
    store: Store,
    coordinator: ConsistencyCoordinator,
    gate: PrivilegeGate,
    /// Recorded as `createdBy` for anonymous creates.
    anonymous_id: String,
}

impl SeaOrmProductService {
    #[must_use]
    pub fn new(store: Store, coordinator: ConsistencyCoordinator, anonymous_id: String) -> Self {
        Self {
            store,
            coordinator,
            gate: PrivilegeGate,
            anonymous_id,
        }
    }

    async fn existing(&self, slug: &str) -> Result<Product, CatalogError> {
        self.store
            .get_product_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    async fn ensure_category(&self, id: &str) -> Result<(), CatalogError> {
        if self.store.get_category(id).await?.is_none() {
            return Err(CatalogError::NotFound(CATEGORY_NOT_FOUND.to_string()));
        }
        Ok(())
    }

    async fn free_slug(&self, title: &str, keep: &[&str]) -> Result<String, CatalogError> {
        let store = &self.store;
        slug::unique_slug(title, keep, |candidate| async move {
            store.product_slug_exists(&candidate).await
        })
        .await
        .map_err(|e| CatalogError::Validation(e.to_string()))
    }

    async fn join(&self, products: Vec<Product>) -> Result<Vec<ProductView>, CatalogError> {
        let mut category_ids: Vec<String> =
            products.iter().filter_map(|p| p.category.clone()).collect();
        category_ids.sort();
        category_ids.dedup();

        let mut creator_ids: Vec<String> = products.iter().map(|p| p.created_by.clone()).collect();
        creator_ids.sort();
        creator_ids.dedup();

        let categories: HashMap<String, _> = self
            .store
            .get_categories_by_ids(&category_ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c.summary()))
            .collect();
        let creators: HashMap<String, _> = self
            .store
            .get_users_by_ids(&creator_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u.summary()))
            .collect();

        Ok(products
            .into_iter()
            .map(|product| {
                let category = product
                    .category
                    .as_ref()
                    .and_then(|id| categories.get(id).cloned());
                let creator = creators.get(&product.created_by).cloned();
                ProductView::new(product, category, creator)
            })
            .collect())
    }
}

fn slug_conflict(err: anyhow::Error) -> CatalogError {
    if is_duplicate_key(&err) {
        CatalogError::Conflict(SLUG_TAKEN.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl ProductService for SeaOrmProductService {
    async fn list(&self, page: PageRequest) -> Result<Page<ProductView>, CatalogError> {
        let (products, total) = self.store.list_products(page).await?;

        Ok(Page {
            content: self.join(products).await?,
            metadata: PageMetadata::new(page, total),
        })
    }

    async fn get(&self, slug: &str) -> Result<ProductView, CatalogError> {
        let product = self.existing(slug).await?;
        let mut views = self.join(vec![product]).await?;
        views
            .pop()
            .ok_or_else(|| CatalogError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    async fn create(
        &self,
        requester: &Requester,
        input: ProductInput,
    ) -> Result<Product, CatalogError> {
        let created_by = requester.id_or(&self.anonymous_id).to_string();

        if !self
            .gate
            .decide(requester, Operation::Create, "product")
            .is_full()
        {
            let timestamp = now();
            return Ok(Product {
                id: new_id(),
                category: Some(input.category),
                created_by,
                slug: slug::normalize(&input.title),
                title: input.title,
                price: input.price,
                description: input.description,
                active: true,
                created_at: timestamp.clone(),
                updated_at: timestamp,
            });
        }

        self.ensure_category(&input.category).await?;
        let slug = self.free_slug(&input.title, &[]).await?;

        let product = self
            .store
            .insert_product(NewProduct {
                category: Some(input.category.clone()),
                created_by,
                slug,
                title: input.title,
                price: input.price,
                description: input.description,
            })
            .await
            .map_err(slug_conflict)?;

        info!(product_id = %product.id, slug = %product.slug, "Created product");
        self.coordinator.submit(BacklinkEvent::Created {
            product_id: product.id.clone(),
            category_id: input.category,
        });

        Ok(product)
    }

    async fn update(
        &self,
        requester: &Requester,
        slug: &str,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        let mut product = self.existing(slug).await?;
        let full = self
            .gate
            .decide(requester, Operation::Update, "product")
            .is_full();

        let new_slug = match (&update.title, update.update_slug) {
            (Some(title), true) if full => Some(self.free_slug(title, &[slug]).await?),
            (Some(title), true) => Some(slug::normalize(title)),
            _ => None,
        };
        let moved_to = update
            .category
            .clone()
            .filter(|c| product.category.as_ref() != Some(c));

        if !full {
            if let Some(new_slug) = new_slug {
                product.slug = new_slug;
            }
            if let Some(category) = update.category {
                product.category = Some(category);
            }
            if let Some(title) = update.title {
                product.title = title;
            }
            if let Some(price) = update.price {
                product.price = price;
            }
            if let Some(description) = update.description {
                product.description = description;
            }
            product.updated_at = now();
            return Ok(product);
        }

        if let Some(to) = &moved_to {
            self.ensure_category(to).await?;
        }

        let updated = self
            .store
            .update_product(
                &product.id,
                ProductPatch {
                    category: update.category,
                    slug: new_slug,
                    title: update.title,
                    price: update.price,
                    description: update.description,
                },
            )
            .await
            .map_err(slug_conflict)?
            .ok_or_else(|| CatalogError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        if let Some(to) = moved_to {
            let event = match product.category {
                Some(from) => BacklinkEvent::Moved {
                    product_id: updated.id.clone(),
                    from,
                    to,
                },
                None => BacklinkEvent::Created {
                    product_id: updated.id.clone(),
                    category_id: to,
                },
            };
            self.coordinator.submit(event);
        }

        Ok(updated)
    }

    async fn delete(&self, requester: &Requester, slug: &str) -> Result<Product, CatalogError> {
        let product = self.existing(slug).await?;

        if !self
            .gate
            .decide(requester, Operation::Delete, "product")
            .is_full()
        {
            return Ok(product);
        }

        let deleted = self
            .store
            .delete_product_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

        info!(product_id = %deleted.id, slug, "Deleted product");
        if let Some(category_id) = deleted.category.clone() {
            self.coordinator.submit(BacklinkEvent::Deleted {
                product_id: deleted.id.clone(),
                category_id,
            });
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RequesterClaims;
    use crate::domain::Role;
    use crate::models::catalog::NewCategory;
    use crate::services::propagation::BacklinkStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts backlink writes without applying them.
    #[derive(Default)]
    struct CountingBacklinks(AtomicUsize);

    #[async_trait]
    impl BacklinkStore for CountingBacklinks {
        async fn push_product(&self, _category_id: &str, _product_id: &str) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn pull_product(&self, _category_id: &str, _product_id: &str) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        service: SeaOrmProductService,
        store: Store,
        coordinator: ConsistencyCoordinator,
    }

    async fn fixture() -> Fixture {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let coordinator = ConsistencyCoordinator::start(Arc::new(store.clone()));
        let service =
            SeaOrmProductService::new(store.clone(), coordinator.clone(), "anon".to_string());
        Fixture {
            service,
            store,
            coordinator,
        }
    }

    fn customer() -> Requester {
        Requester::authenticated(RequesterClaims {
            id: "customer".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Customer,
        })
    }

    fn admin() -> Requester {
        Requester::authenticated(RequesterClaims {
            id: "admin".to_string(),
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role: Role::SuperAdmin,
        })
    }

    async fn category(store: &Store, slug: &str) -> String {
        store
            .insert_category(NewCategory {
                parent: None,
                slug: slug.to_string(),
                name: slug.to_string(),
                description: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    fn input(category: &str, title: &str) -> ProductInput {
        ProductInput {
            category: category.to_string(),
            title: title.to_string(),
            price: 250,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_links_category_after_flush() {
        let f = fixture().await;
        let shoes = category(&f.store, "shoes").await;

        let product = f
            .service
            .create(&admin(), input(&shoes, "Red Shoes"))
            .await
            .unwrap();
        assert_eq!(product.slug, "red-shoes");
        assert_eq!(product.created_by, "admin");

        f.coordinator.flush().await;
        let stored = f.store.get_category(&shoes).await.unwrap().unwrap();
        assert_eq!(stored.products, vec![product.id]);
    }

    #[tokio::test]
    async fn test_create_requires_existing_category() {
        let f = fixture().await;
        let err = f
            .service
            .create(&admin(), input("missing", "Red Shoes"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_move_and_delete_update_backlinks() {
        let f = fixture().await;
        let shoes = category(&f.store, "shoes").await;
        let boots = category(&f.store, "boots").await;

        let product = f
            .service
            .create(&admin(), input(&shoes, "Red Shoes"))
            .await
            .unwrap();
        f.service
            .update(
                &admin(),
                "red-shoes",
                ProductUpdate {
                    category: Some(boots.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        f.coordinator.flush().await;

        let shoes_row = f.store.get_category(&shoes).await.unwrap().unwrap();
        let boots_row = f.store.get_category(&boots).await.unwrap().unwrap();
        assert!(shoes_row.products.is_empty());
        assert_eq!(boots_row.products, vec![product.id]);

        f.service.delete(&admin(), "red-shoes").await.unwrap();
        f.coordinator.flush().await;
        let boots_row = f.store.get_category(&boots).await.unwrap().unwrap();
        assert!(boots_row.products.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_create_is_simulated() {
        let f = fixture().await;
        let product = f
            .service
            .create(&Requester::anonymous(), input("whatever", "Blue Hat"))
            .await
            .unwrap();

        assert_eq!(product.created_by, "anon");
        assert_eq!(product.slug, "blue-hat");
        assert!(f.store.get_product_by_slug("blue-hat").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_joins_category_summary() {
        let f = fixture().await;
        let shoes = category(&f.store, "shoes").await;
        for title in ["A", "B", "C"] {
            f.service.create(&admin(), input(&shoes, title)).await.unwrap();
        }

        let page = f
            .service
            .list(PageRequest { page: 1, limit: 2 })
            .await
            .unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.metadata.total_pages, 2);
        assert_eq!(page.metadata.next_page, Some(2));
        let summary = page.content[0].category.as_ref().unwrap();
        assert_eq!(summary.slug, "shoes");
        // Creator "admin" is not a stored user.
        assert!(page.content[0].created_by.is_none());
    }

    #[tokio::test]
    async fn test_customer_update_and_delete_are_simulated() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let backlinks = Arc::new(CountingBacklinks::default());
        let coordinator = ConsistencyCoordinator::start(backlinks.clone());
        let service =
            SeaOrmProductService::new(store.clone(), coordinator.clone(), "anon".to_string());

        let shoes = category(&store, "shoes").await;
        let boots = category(&store, "boots").await;
        let product = service
            .create(&admin(), input(&shoes, "Red Shoes"))
            .await
            .unwrap();
        coordinator.flush().await;
        assert_eq!(backlinks.0.load(Ordering::SeqCst), 1);

        let moved = service
            .update(
                &customer(),
                "red-shoes",
                ProductUpdate {
                    category: Some(boots.clone()),
                    title: Some("Cheap Shoes".to_string()),
                    price: Some(1),
                    update_slug: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.category.as_deref(), Some(boots.as_str()));
        assert_eq!(moved.slug, "cheap-shoes");

        let deleted = service.delete(&customer(), "red-shoes").await.unwrap();
        assert_eq!(deleted.id, product.id);
        coordinator.flush().await;

        assert_eq!(backlinks.0.load(Ordering::SeqCst), 1);
        let stored = store.get_product_by_slug("red-shoes").await.unwrap().unwrap();
        assert_eq!(stored.category.as_deref(), Some(shoes.as_str()));
        assert_eq!(stored.title, "Red Shoes");
        assert_eq!(stored.price, 250);
        assert!(store.get_product_by_slug("cheap-shoes").await.unwrap().is_none());
    }
}

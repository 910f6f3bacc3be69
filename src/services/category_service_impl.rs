//! `SeaORM` implementation of the `CategoryService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::auth::{Operation, PrivilegeGate, Requester};
use crate::db::{Store, is_duplicate_key, now};
use crate::domain::new_id;
use crate::models::catalog::{Category, CategoryPatch, NewCategory};
use crate::services::category_service::{
    CATEGORY_NOT_FOUND, CatalogError, CategoryInput, CategoryService, CategoryUpdate,
};
use crate::services::slug;

const SLUG_TAKEN: &str = "category slug is already in use";

pub struct SeaOrmCategoryService {
    store: Store,
    gate: PrivilegeGate,
}

impl SeaOrmCategoryService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            store,
            gate: PrivilegeGate,
        }
    }

    async fn existing(&self, slug: &str) -> Result<Category, CatalogError> {
        self.store
            .get_category_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(CATEGORY_NOT_FOUND.to_string()))
    }

    async fn free_slug(&self, name: &str, keep: &[&str]) -> Result<String, CatalogError> {
        let store = &self.store;
        slug::unique_slug(name, keep, |candidate| async move {
            store.category_slug_exists(&candidate).await
        })
        .await
        .map_err(|e| CatalogError::Validation(e.to_string()))
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
impl CategoryService for SeaOrmCategoryService {
    async fn list(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.store.list_categories().await?)
    }

    async fn get(&self, slug: &str) -> Result<Category, CatalogError> {
        self.existing(slug).await
    }

    async fn create(
        &self,
        requester: &Requester,
        input: CategoryInput,
    ) -> Result<Category, CatalogError> {
        if !self
            .gate
            .decide(requester, Operation::Create, "category")
            .is_full()
        {
            let timestamp = now();
            return Ok(Category {
                id: new_id(),
                parent: input.parent,
                slug: slug::normalize(&input.name),
                name: input.name,
                description: input.description,
                products: Vec::new(),
                created_at: timestamp.clone(),
                updated_at: timestamp,
            });
        }

        let slug = self.free_slug(&input.name, &[]).await?;
        let category = self
            .store
            .insert_category(NewCategory {
                parent: input.parent,
                slug,
                name: input.name,
                description: input.description,
            })
            .await
            .map_err(slug_conflict)?;

        info!(category_id = %category.id, slug = %category.slug, "Created category");
        Ok(category)
    }

    async fn update(
        &self,
        requester: &Requester,
        slug: &str,
        update: CategoryUpdate,
    ) -> Result<Category, CatalogError> {
        let mut category = self.existing(slug).await?;
        let full = self
            .gate
            .decide(requester, Operation::Update, "category")
            .is_full();

        let new_slug = match (&update.name, update.update_slug) {
            (Some(name), true) if full => Some(self.free_slug(name, &[slug]).await?),
            (Some(name), true) => Some(slug::normalize(name)),
            _ => None,
        };

        if !full {
            if let Some(new_slug) = new_slug {
                category.slug = new_slug;
            }
            if let Some(name) = update.name {
                category.name = name;
            }
            if let Some(description) = update.description {
                category.description = description;
            }
            category.updated_at = now();
            return Ok(category);
        }

        self.store
            .update_category(
                &category.id,
                CategoryPatch {
                    slug: new_slug,
                    name: update.name,
                    description: update.description,
                },
            )
            .await
            .map_err(slug_conflict)?
            .ok_or_else(|| CatalogError::NotFound(CATEGORY_NOT_FOUND.to_string()))
    }

    async fn delete(&self, requester: &Requester, slug: &str) -> Result<Category, CatalogError> {
        let category = self.existing(slug).await?;

        if self
            .gate
            .decide(requester, Operation::Delete, "category")
            .is_full()
        {
            if !self.store.delete_category_by_slug(slug).await? {
                return Err(CatalogError::NotFound(CATEGORY_NOT_FOUND.to_string()));
            }
            info!(category_id = %category.id, slug, "Deleted category");
        }

        Ok(category)
    }

    async fn reconcile(&self, category_id: &str) -> Result<bool, CatalogError> {
        let ids = self.store.product_ids_in_category(category_id).await?;
        let drifted = self.store.set_category_products(category_id, ids).await?;

        if drifted {
            warn!(category_id, "Repaired drifted category backlinks");
        }
        Ok(drifted)
    }

    async fn reconcile_all(&self) -> Result<usize, CatalogError> {
        let mut repaired = 0;
        for category in self.store.list_categories().await? {
            if self.reconcile(&category.id).await? {
                repaired += 1;
            }
        }

        info!(repaired, "Reconciled category backlinks");
        Ok(repaired)
    }
}

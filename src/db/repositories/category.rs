use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::{MAX_CAS_ATTEMPTS, now, write_error};
use crate::domain::new_id;
use crate::entities::{categories, prelude::*};
use crate::models::catalog::{Category, CategoryPatch, NewCategory};

/// Repository for categories and their product backlinks.
pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: categories::Model) -> Result<Category> {
        let products: Vec<String> = serde_json::from_str(&model.products_json)
            .with_context(|| format!("Corrupt product list for category {}", model.id))?;

        Ok(Category {
            id: model.id,
            parent: model.parent,
            slug: model.slug,
            name: model.name,
            description: model.description,
            products,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub async fn insert(&self, category: NewCategory) -> Result<Category> {
        let timestamp = now();
        let model = categories::Model {
            id: new_id(),
            parent: category.parent,
            slug: category.slug,
            name: category.name,
            description: category.description,
            products_json: "[]".to_string(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        let active: categories::ActiveModel = model.clone().into();
        Categories::insert(active)
            .exec_without_returning(&self.conn)
            .await
            .map_err(|e| write_error(e, "Failed to insert category"))?;

        Self::map_model(model)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Category>> {
        Categories::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query category by ID")?
            .map(Self::map_model)
            .transpose()
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Categories::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query category by slug")?
            .map(Self::map_model)
            .transpose()
    }

    pub async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Categories::find()
            .filter(categories::Column::Id.is_in(ids.iter().cloned()))
            .all(&self.conn)
            .await
            .context("Failed to query categories by IDs")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows = Categories::find()
            .order_by_asc(categories::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = Categories::find()
            .filter(categories::Column::Slug.eq(slug))
            .count(&self.conn)
            .await
            .context("Failed to check category slug")?;

        Ok(count > 0)
    }

    pub async fn update(&self, id: &str, patch: CategoryPatch) -> Result<Option<Category>> {
        let Some(category) = Categories::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query category for update")?
        else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = category.into();
        if let Some(slug) = patch.slug {
            active.slug = Set(slug);
        }
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        active.updated_at = Set(now());

        let updated = active
            .update(&self.conn)
            .await
            .map_err(|e| write_error(e, "Failed to update category"))?;

        Self::map_model(updated).map(Some)
    }

    pub async fn delete_by_slug(&self, slug: &str) -> Result<bool> {
        let result = Categories::delete_many()
            .filter(categories::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await
            .context("Failed to delete category")?;

        Ok(result.rows_affected > 0)
    }

    /// Applies `apply` to the product id list as a single-row compare-and-swap.
    ///
    /// `apply` returns whether it changed the list; unchanged lists are not written.
    /// Errors if the category does not exist.
    pub async fn modify_products<F>(&self, id: &str, apply: F) -> Result<bool>
    where
        F: Fn(&mut Vec<String>) -> bool + Send + Sync,
    {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let row = Categories::find_by_id(id.to_string())
                .one(&self.conn)
                .await
                .context("Failed to query category backlinks")?
                .ok_or_else(|| anyhow::anyhow!("Category not found: {id}"))?;

            let mut products: Vec<String> = serde_json::from_str(&row.products_json)
                .with_context(|| format!("Corrupt product list for category {id}"))?;

            if !apply(&mut products) {
                return Ok(false);
            }

            let result = Categories::update_many()
                .col_expr(
                    categories::Column::ProductsJson,
                    serde_json::to_string(&products)?.into(),
                )
                .col_expr(categories::Column::UpdatedAt, now().into())
                .filter(categories::Column::Id.eq(id))
                .filter(categories::Column::ProductsJson.eq(row.products_json))
                .exec(&self.conn)
                .await
                .context("Failed to write category backlinks")?;

            if result.rows_affected == 1 {
                return Ok(true);
            }
        }

        anyhow::bail!("Category {id} kept changing while updating backlinks")
    }
}

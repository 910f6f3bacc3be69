use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::db::{now, write_error};
use crate::domain::{PageRequest, new_id};
use crate::entities::{prelude::*, products};
use crate::models::catalog::{NewProduct, Product, ProductPatch};

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            category: model.category,
            created_by: model.created_by,
            slug: model.slug,
            title: model.title,
            price: model.price,
            description: model.description,
            active: model.active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, product: NewProduct) -> Result<Product> {
        let timestamp = now();
        let model = products::Model {
            id: new_id(),
            category: product.category,
            created_by: product.created_by,
            slug: product.slug,
            title: product.title,
            price: product.price,
            description: product.description,
            active: true,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        let active: products::ActiveModel = model.clone().into();
        Products::insert(active)
            .exec_without_returning(&self.conn)
            .await
            .map_err(|e| write_error(e, "Failed to insert product"))?;

        Ok(Product::from(model))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let row = Products::find()
            .filter(products::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query product by slug")?;

        Ok(row.map(Product::from))
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = Products::find()
            .filter(products::Column::Slug.eq(slug))
            .count(&self.conn)
            .await
            .context("Failed to check product slug")?;

        Ok(count > 0)
    }

    pub async fn list_page(&self, page: PageRequest) -> Result<(Vec<Product>, u64)> {
        let total = Products::find()
            .count(&self.conn)
            .await
            .context("Failed to count products")?;

        let rows = Products::find()
            .order_by_asc(products::Column::CreatedAt)
            .order_by_asc(products::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.conn)
            .await
            .context("Failed to list products")?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Ground truth for a category's backlinks.
    pub async fn ids_in_category(&self, category_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = Products::find()
            .select_only()
            .column(products::Column::Id)
            .filter(products::Column::Category.eq(category_id))
            .order_by_asc(products::Column::CreatedAt)
            .order_by_asc(products::Column::Id)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query products by category")?;

        Ok(ids)
    }

    pub async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>> {
        let Some(product) = Products::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query product for update")?
        else {
            return Ok(None);
        };

        let mut active: products::ActiveModel = product.into();
        if let Some(category) = patch.category {
            active.category = Set(Some(category));
        }
        if let Some(slug) = patch.slug {
            active.slug = Set(slug);
        }
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(price) = patch.price {
            active.price = Set(price);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        active.updated_at = Set(now());

        let updated = active
            .update(&self.conn)
            .await
            .map_err(|e| write_error(e, "Failed to update product"))?;

        Ok(Some(Product::from(updated)))
    }

    pub async fn delete_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let Some(product) = Products::find()
            .filter(products::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query product for delete")?
        else {
            return Ok(None);
        };

        let result = Products::delete_by_id(product.id.clone())
            .exec(&self.conn)
            .await
            .context("Failed to delete product")?;

        Ok((result.rows_affected > 0).then(|| Product::from(product)))
    }
}

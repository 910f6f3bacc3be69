use serde::{Deserialize, Serialize};

use super::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub parent: Option<String>,
    pub slug: String,
    pub name: String,
    pub description: String,
    /// Product ids referencing this category. May lag behind the products table.
    pub products: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Category {
    #[must_use]
    pub fn summary(&self) -> CategorySummary {
        CategorySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub category: Option<String>,
    pub created_by: String,
    pub slug: String,
    pub title: String,
    pub price: i64,
    pub description: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Product joined with its category and creator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub price: i64,
    pub description: String,
    pub active: bool,
    pub category: Option<CategorySummary>,
    pub created_by: Option<UserSummary>,
    pub created_at: String,
    pub updated_at: String,
}

impl ProductView {
    #[must_use]
    pub fn new(
        product: Product,
        category: Option<CategorySummary>,
        created_by: Option<UserSummary>,
    ) -> Self {
        Self {
            id: product.id,
            slug: product.slug,
            title: product.title,
            price: product.price,
            description: product.description,
            active: product.active,
            category,
            created_by,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub parent: Option<String>,
    pub slug: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category: Option<String>,
    pub created_by: String,
    pub slug: String,
    pub title: String,
    pub price: i64,
    pub description: String,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub category: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
}

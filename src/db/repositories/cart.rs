use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::db::{MAX_CAS_ATTEMPTS, is_duplicate_key, now, write_error};
use crate::domain::new_id;
use crate::entities::{carts, prelude::*};
use crate::models::cart::{Cart, CartLine};

pub struct CartRepository {
    conn: DatabaseConnection,
}

impl CartRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: carts::Model) -> Result<Cart> {
        let products: Vec<CartLine> = serde_json::from_str(&model.lines_json)
            .with_context(|| format!("Corrupt cart lines for cart {}", model.id))?;

        Ok(Cart {
            id: model.id,
            user_id: model.user_id,
            products,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    async fn find_row(&self, user_id: &str) -> Result<Option<carts::Model>> {
        Carts::find()
            .filter(carts::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query cart")
    }

    pub async fn get_by_user(&self, user_id: &str) -> Result<Option<Cart>> {
        self.find_row(user_id).await?.map(Self::map_model).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Cart>> {
        let rows = Carts::find()
            .order_by_asc(carts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list carts")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    /// Upserts the user's cart, applying `apply` to the current lines
    /// (empty for a new cart) under compare-and-swap.
    pub async fn modify_lines<F>(&self, user_id: &str, apply: F) -> Result<Cart>
    where
        F: Fn(&mut Vec<CartLine>) + Send + Sync,
    {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let Some(row) = self.find_row(user_id).await? else {
                let mut lines = Vec::new();
                apply(&mut lines);

                let timestamp = now();
                let model = carts::Model {
                    id: new_id(),
                    user_id: user_id.to_string(),
                    lines_json: serde_json::to_string(&lines)?,
                    created_at: timestamp.clone(),
                    updated_at: timestamp,
                };

                let active: carts::ActiveModel = model.clone().into();
                match Carts::insert(active)
                    .exec_without_returning(&self.conn)
                    .await
                    .map_err(|e| write_error(e, "Failed to insert cart"))
                {
                    Ok(_) => return Self::map_model(model),
                    // Lost the race to create the cart; retry as an update.
                    Err(e) if is_duplicate_key(&e) => continue,
                    Err(e) => return Err(e),
                }
            };

            let mut cart = Self::map_model(row.clone())?;
            apply(&mut cart.products);
            let lines_json = serde_json::to_string(&cart.products)?;
            let timestamp = now();

            let result = Carts::update_many()
                .col_expr(carts::Column::LinesJson, lines_json.into())
                .col_expr(carts::Column::UpdatedAt, timestamp.clone().into())
                .filter(carts::Column::Id.eq(row.id.as_str()))
                .filter(carts::Column::LinesJson.eq(row.lines_json))
                .exec(&self.conn)
                .await
                .context("Failed to update cart")?;

            if result.rows_affected == 1 {
                cart.updated_at = timestamp;
                return Ok(cart);
            }
        }

        anyhow::bail!("Cart for user {user_id} kept changing during update")
    }
}

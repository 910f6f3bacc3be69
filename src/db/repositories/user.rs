use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::warn;

use crate::db::{now, write_error};
use crate::domain::{Role, new_id};
use crate::entities::{prelude::*, users};
use crate::models::user::{NewUser, User, UserFilter, UserPatch};

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        let role = model.role.parse().unwrap_or_else(|e| {
            warn!(user_id = %model.id, "{e}; treating as customer");
            Role::Customer
        });

        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            number: model.number,
            status: model.status,
            role,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, user: NewUser) -> Result<User> {
        let timestamp = now();
        let model = users::Model {
            id: new_id(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            number: user.number,
            status: user.status,
            role: user.role.as_str().to_string(),
            last_login_at: None,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        let active: users::ActiveModel = model.clone().into();
        Users::insert(active)
            .exec_without_returning(&self.conn)
            .await
            .map_err(|e| write_error(e, "Failed to insert user"))?;

        Ok(User::from(model))
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let user = Users::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Users::find()
            .filter(users::Column::Id.is_in(ids.iter().cloned()))
            .all(&self.conn)
            .await
            .context("Failed to query users by IDs")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email_with_password(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn list(&self, filter: UserFilter) -> Result<Vec<User>> {
        let mut query = Users::find();

        if let Some(role) = filter.role {
            query = query.filter(users::Column::Role.eq(role.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(users::Column::Status.eq(status));
        }

        let rows = query
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn update(&self, id: &str, patch: UserPatch) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(hash) = patch.password_hash {
            active.password = Set(hash);
        }
        if let Some(number) = patch.number {
            active.number = Set(Some(number));
        }
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        active.updated_at = Set(now());

        let updated = active
            .update(&self.conn)
            .await
            .map_err(|e| write_error(e, "Failed to update user"))?;

        Ok(Some(User::from(updated)))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Users::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn record_login(&self, id: &str) -> Result<()> {
        let timestamp = now();
        Users::update_many()
            .col_expr(users::Column::LastLoginAt, Some(timestamp.clone()).into())
            .col_expr(users::Column::UpdatedAt, timestamp.into())
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to record login time")?;

        Ok(())
    }
}

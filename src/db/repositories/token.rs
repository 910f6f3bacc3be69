use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::db::{now, write_error};
use crate::domain::{TokenKind, new_id};
use crate::entities::{prelude::*, tokens};
use crate::models::token::TokenRecord;

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: tokens::Model) -> TokenRecord {
        TokenRecord {
            id: model.id,
            user_id: model.user_id,
            token: model.token,
            // Only refresh tokens are persisted.
            kind: TokenKind::Refresh,
            created_at: model.created_at,
        }
    }

    pub async fn insert(&self, user_id: &str, token: &str, kind: TokenKind) -> Result<TokenRecord> {
        let model = tokens::Model {
            id: new_id(),
            user_id: user_id.to_string(),
            token: token.to_string(),
            kind: kind.as_str().to_string(),
            created_at: now(),
        };

        let active: tokens::ActiveModel = model.clone().into();
        Tokens::insert(active)
            .exec_without_returning(&self.conn)
            .await
            .map_err(|e| write_error(e, "Failed to insert token"))?;

        Ok(Self::map_model(model))
    }

    pub async fn delete(&self, token: &str) -> Result<bool> {
        let result = Tokens::delete_many()
            .filter(tokens::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete token")?;

        Ok(result.rows_affected > 0)
    }
}

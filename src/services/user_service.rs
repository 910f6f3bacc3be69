//! Domain service for user accounts.
//!
//! Writes from non-privileged requesters are simulated: the returned record
//! reflects what would have been stored, and nothing is persisted.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Requester;
use crate::config::SeedUser;
use crate::domain::Role;
use crate::models::user::{User, UserFilter};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user is not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

pub const EMAIL_TAKEN: &str = "user is exists! try with another email";

/// Registration and admin-create payload.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub number: Option<String>,
}

impl From<&SeedUser> for NewAccount {
    fn from(seed: &SeedUser) -> Self {
        Self {
            name: seed.name.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            number: seed.number.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
    pub number: Option<String>,
    pub status: Option<bool>,
}

#[async_trait]
pub trait UserService: Send + Sync {
    /// Lists users. Non-privileged requesters only ever see customers.
    async fn list(&self, requester: &Requester, filter: UserFilter) -> Result<Vec<User>, UserError>;

    async fn get(&self, id: &str) -> Result<User, UserError>;

    /// Persists an active customer account regardless of requester.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] when the email is taken.
    async fn register(&self, account: NewAccount) -> Result<User, UserError>;

    /// Admin create: [`UserService::register`] for privileged requesters,
    /// simulated otherwise. The email check runs on both paths.
    async fn create(&self, requester: &Requester, account: NewAccount) -> Result<User, UserError>;

    async fn update(
        &self,
        requester: &Requester,
        id: &str,
        update: AccountUpdate,
    ) -> Result<User, UserError>;

    /// Deletes a user and returns the record as it was.
    async fn delete(&self, requester: &Requester, id: &str) -> Result<User, UserError>;

    /// Inserts `seed` with `role` unless its email already exists.
    async fn ensure_seeded(&self, seed: &SeedUser, role: Role) -> Result<User, UserError>;
}

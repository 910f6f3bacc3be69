//! Domain service for authentication.
//!
//! Handles registration, login and the refresh-token exchange.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::{TokenError, TokenPair};
use crate::services::user_service::{NewAccount, UserError};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Conflict(String),

    #[error("user is not found")]
    UserNotFound,

    #[error("Please contact to admin for active you account!")]
    Disabled,

    #[error("Password is wrong!")]
    BadCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Refresh token expired, mis-signed or revoked.
    #[error("Please login again to get token!")]
    RefreshRejected,

    #[error("Failed to generate tokens: {0}")]
    Signing(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        Self::Signing(err.to_string())
    }
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::NotFound => Self::UserNotFound,
            UserError::Validation(msg) => Self::Validation(msg),
            UserError::Database(msg) => Self::Database(msg),
            UserError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// Domain service trait for authentication.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a customer account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the email is already registered.
    async fn register(&self, account: NewAccount) -> Result<TokenPair, AuthError>;

    /// Verifies credentials and issues a token pair.
    ///
    /// Refresh tokens of super admins are persisted so they can be revoked.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`], [`AuthError::Disabled`] or
    /// [`AuthError::BadCredentials`], checked in that order.
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Exchanges a refresh token for a new pair without re-authenticating.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RefreshRejected`] for expired, invalid or revoked tokens.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
}

//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{RequesterClaims, TokenAuthority, TokenPair};
use crate::db::Store;
use crate::domain::TokenKind;
use crate::models::user::User;
use crate::services::auth_service::{AuthError, AuthService};
use crate::services::password::Hasher;
use crate::services::user_service::{NewAccount, UserService};

pub struct SeaOrmAuthService {
    store: Store,
    users: Arc<dyn UserService>,
    hasher: Arc<dyn Hasher>,
    tokens: TokenAuthority,
    lifetime_ms: i64,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        users: Arc<dyn UserService>,
        hasher: Arc<dyn Hasher>,
        tokens: TokenAuthority,
        lifetime_ms: i64,
    ) -> Self {
        Self {
            store,
            users,
            hasher,
            tokens,
            lifetime_ms,
        }
    }

    fn claims_for(user: &User) -> RequesterClaims {
        RequesterClaims {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }

    /// Issues a pair; privileged refresh tokens are recorded for revocation.
    async fn issue(&self, claims: &RequesterClaims) -> Result<TokenPair, AuthError> {
        let pair = self.tokens.issue(claims, self.lifetime_ms)?;

        if claims.is_privileged() {
            self.store
                .insert_token(&claims.id, &pair.refresh_token, TokenKind::Refresh)
                .await?;
        }

        Ok(pair)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, account: NewAccount) -> Result<TokenPair, AuthError> {
        let user = self.users.register(account).await?;
        self.issue(&Self::claims_for(&user)).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let (user, digest) = self
            .store
            .get_user_credentials(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.status {
            return Err(AuthError::Disabled);
        }

        if !self.hasher.verify(password, &digest).await? {
            return Err(AuthError::BadCredentials);
        }

        let pair = self.issue(&Self::claims_for(&user)).await?;

        if let Err(e) = self.store.record_login(&user.id).await {
            warn!(error = %e, user_id = %user.id, "Failed to update login time");
        }

        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        if !self.tokens.verify_refresh(refresh_token) {
            return Err(AuthError::RefreshRejected);
        }

        let claims = TokenAuthority::decode_claims(refresh_token)
            .map_err(|_| AuthError::RefreshRejected)?;

        if claims.is_privileged() {
            // Rotation: the presented token is consumed.
            if !self.store.delete_token(refresh_token).await? {
                warn!(user_id = %claims.id, "Rejected revoked refresh token");
                return Err(AuthError::RefreshRejected);
            }
        }

        self.issue(&claims).await
    }
}

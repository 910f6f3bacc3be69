use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{phone_number, require, validate_email, validate_number};
use super::{ApiError, ApiResponse, AppState, Payload};
use crate::auth::{TokenAuthority, TokenPair, bearer_token};
use crate::services::NewAccount;

pub const TOKEN_INVALID: &str = "Token is missing or expired or invalid";

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, deserialize_with = "phone_number")]
    pub number: Option<String>,
}

impl RegisterRequest {
    /// Shared by registration and admin user creation.
    pub fn into_account(self) -> Result<NewAccount, ApiError> {
        let email = validate_email(&self.email)?;
        let password = require(&self.password, "password")?.to_string();
        let name = require(&self.name, "name")?.to_string();

        Ok(NewAccount {
            name,
            email,
            password,
            number: validate_number(self.number)?,
        })
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Attaches the bearer token's claims to the request.
///
/// Requests without a token pass through as anonymous; a token that fails
/// verification is rejected with 401.
pub async fn attach_requester(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    if let Some(token) = token {
        if !state.shared.tokens.verify(&token) {
            return Err(ApiError::unauthorized(TOKEN_INVALID));
        }

        let claims = TokenAuthority::decode_claims(&token)
            .map_err(|_| ApiError::unauthorized(TOKEN_INVALID))?;

        tracing::Span::current().record("user_id", claims.id.as_str());
        request.extensions_mut().insert(claims);
    }

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenPair>>), ApiError> {
    let account = payload.into_account()?;
    let tokens = state.shared.auth_service.register(account).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Success! User registration successful",
            tokens,
        )),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let email = require(&payload.email, "email")?;
    let password = require(&payload.password, "password")?;

    let tokens = state.shared.auth_service.login(email, password).await?;

    Ok(Json(ApiResponse::success("Success! User logged in", tokens)))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let token = payload.refresh_token.trim();
    if token.is_empty() {
        return Err(ApiError::validation("refresh token is required"));
    }

    let tokens = state.shared.auth_service.refresh(token).await?;

    Ok(Json(ApiResponse::success(
        "Success! New tokens generated",
        tokens,
    )))
}

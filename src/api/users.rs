use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::RegisterRequest;
use super::validation::{phone_number, validate_number};
use super::{ApiError, ApiResponse, AppState, Payload};
use crate::auth::Requester;
use crate::domain::Role;
use crate::models::user::{User, UserFilter};
use crate::services::AccountUpdate;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<String>,
    pub status: Option<String>,
}

impl UserQuery {
    fn into_filter(self) -> Result<UserFilter, ApiError> {
        let role = self
            .role
            .filter(|r| !r.is_empty())
            .map(|r| r.parse::<Role>().map_err(ApiError::validation))
            .transpose()?;

        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(ApiError::validation(format!("invalid status: {other}")));
            }
        };

        Ok(UserFilter { role, status })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "phone_number")]
    pub number: Option<String>,
    pub status: Option<bool>,
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Query(query): Query<UserQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let filter = query.into_filter()?;
    let users = state.shared.user_service.list(&requester, filter).await?;

    Ok(Json(ApiResponse::success("Success! User list", users)))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let account = payload.into_account()?;
    let user = state.shared.user_service.create(&requester, account).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Success! User created", user)),
    ))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = state.shared.user_service.get(&id).await?;
    Ok(Json(ApiResponse::success("Success! User description", user)))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
    Payload(payload): Payload<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let update = AccountUpdate {
        name: payload.name.filter(|n| !n.trim().is_empty()),
        password: payload.password.filter(|p| !p.is_empty()),
        number: validate_number(payload.number)?,
        status: payload.status,
    };

    let user = state
        .shared
        .user_service
        .update(&requester, &id, update)
        .await?;

    Ok(Json(ApiResponse::success("Success! User updated", user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.shared.user_service.delete(&requester, &id).await?;
    Ok(Json(ApiResponse::empty("Success! User delete")))
}

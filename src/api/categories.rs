use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::require;
use super::{ApiError, ApiResponse, AppState, Payload};
use crate::auth::Requester;
use crate::models::catalog::Category;
use crate::services::{CategoryInput, CategoryUpdate};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub update_slug: bool,
}

/// GET /categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.shared.category_service.list().await?;
    Ok(Json(ApiResponse::success(
        "Success! Category list",
        categories,
    )))
}

/// POST /categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Payload(payload): Payload<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    let input = CategoryInput {
        name: require(&payload.name, "name")?.to_string(),
        description: payload.description,
        parent: payload.parent.filter(|p| !p.is_empty()),
    };

    let category = state
        .shared
        .category_service
        .create(&requester, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Success! Category created", category)),
    ))
}

/// GET /categories/{slug}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state.shared.category_service.get(&slug).await?;
    Ok(Json(ApiResponse::success(
        "Success! Category description",
        category,
    )))
}

/// PUT /categories/{slug}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(slug): Path<String>,
    Payload(payload): Payload<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let update = CategoryUpdate {
        name: payload.name.filter(|n| !n.trim().is_empty()),
        description: payload.description,
        update_slug: payload.update_slug,
    };

    let category = state
        .shared
        .category_service
        .update(&requester, &slug, update)
        .await?;

    Ok(Json(ApiResponse::success(
        "Success! category updated",
        category,
    )))
}

/// DELETE /categories/{slug}
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .shared
        .category_service
        .delete(&requester, &slug)
        .await?;
    Ok(Json(ApiResponse::empty("Success! Category deleted")))
}

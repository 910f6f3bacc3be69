use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{require, validate_page, validate_price};
use super::{ApiError, ApiResponse, AppState, Payload};
use crate::auth::Requester;
use crate::domain::Page;
use crate::models::catalog::{Product, ProductView};
use crate::services::{ProductInput, ProductUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    pub price: Option<i64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub category: Option<String>,
    pub title: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub update_slug: bool,
}

/// GET /products?page=&limit=
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<ProductView>>>, ApiError> {
    let page = validate_page(query.page, query.limit)?;
    let products = state.shared.product_service.list(page).await?;

    Ok(Json(ApiResponse::success("Success! Product list", products)))
}

/// POST /products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Payload(payload): Payload<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let title = require(&payload.title, "title")?.to_string();
    let price = payload
        .price
        .ok_or_else(|| ApiError::validation("price is required"))?;
    let category = require(&payload.category, "category")?.to_string();

    let input = ProductInput {
        category,
        title,
        price: validate_price(price)?,
        description: payload.description,
    };

    let product = state
        .shared
        .product_service
        .create(&requester, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Success! Product created", product)),
    ))
}

/// GET /products/{slug}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ProductView>>, ApiError> {
    let product = state.shared.product_service.get(&slug).await?;
    Ok(Json(ApiResponse::success(
        "Success! Product description",
        product,
    )))
}

/// PUT /products/{slug}
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(slug): Path<String>,
    Payload(payload): Payload<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let update = ProductUpdate {
        category: payload.category.filter(|c| !c.is_empty()),
        title: payload.title.filter(|t| !t.trim().is_empty()),
        price: payload.price.map(validate_price).transpose()?,
        description: payload.description,
        update_slug: payload.update_slug,
    };

    let product = state
        .shared
        .product_service
        .update(&requester, &slug, update)
        .await?;

    Ok(Json(ApiResponse::success("Success! Product updated", product)))
}

/// DELETE /products/{slug}
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .shared
        .product_service
        .delete(&requester, &slug)
        .await?;
    Ok(Json(ApiResponse::empty("Success! Product deleted")))
}

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::require;
use super::{ApiError, ApiResponse, AppState, Payload};
use crate::auth::Requester;
use crate::models::cart::{Cart, CartLine};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLineRequest {
    #[serde(default)]
    pub product_id: String,
}

fn check_lines(lines: &[CartLine]) -> Result<(), ApiError> {
    if lines.iter().any(|l| l.product_id.trim().is_empty()) {
        return Err(ApiError::validation("productId is required"));
    }
    Ok(())
}

/// GET /cart
pub async fn view_cart(
    State(state): State<Arc<AppState>>,
    requester: Requester,
) -> Result<Json<ApiResponse<Cart>>, ApiError> {
    let response = match state.shared.cart_service.view(&requester).await? {
        Some(cart) => ApiResponse::success("User cart", cart),
        None => ApiResponse::empty("User cart empty"),
    };
    Ok(Json(response))
}

/// PUT /cart
pub async fn replace_cart(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Payload(lines): Payload<Vec<CartLine>>,
) -> Result<Json<ApiResponse<Cart>>, ApiError> {
    check_lines(&lines)?;
    let cart = state.shared.cart_service.replace(&requester, lines).await?;

    Ok(Json(ApiResponse::success("Success! Cart update", cart)))
}

/// PUT /cart/add
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Payload(line): Payload<CartLine>,
) -> Result<Json<ApiResponse<Cart>>, ApiError> {
    check_lines(std::slice::from_ref(&line))?;
    let cart = state.shared.cart_service.add(&requester, line).await?;

    Ok(Json(ApiResponse::success("Success! Cart update", cart)))
}

/// PUT /cart/remove
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Payload(payload): Payload<RemoveLineRequest>,
) -> Result<Json<ApiResponse<Cart>>, ApiError> {
    let product_id = require(&payload.product_id, "productId")?;
    let cart = state
        .shared
        .cart_service
        .remove(&requester, product_id)
        .await?;

    Ok(Json(ApiResponse::success("Success! Cart update", cart)))
}

/// GET /carts
pub async fn list_carts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Cart>>>, ApiError> {
    let carts = state.shared.cart_service.list_all().await?;
    Ok(Json(ApiResponse::success("Success! All carts list", carts)))
}

/// GET /carts/{userId}
pub async fn get_user_cart(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Cart>>, ApiError> {
    let cart = state.shared.cart_service.get_for_user(&user_id).await?;
    Ok(Json(ApiResponse::success("User Cart", cart)))
}

use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// GET /
pub async fn welcome() -> Json<ApiResponse<()>> {
    Json(ApiResponse::empty("Welcome to store-api!"))
}

/// GET /health
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthStatus>>, ApiError> {
    state.shared.store.ping().await?;

    Ok(Json(ApiResponse::success(
        "I am alive...",
        HealthStatus {
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        },
    )))
}

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::Serialize;
use tracing::debug;

use super::ApiError;

pub const BIND_FAILED: &str = "Failed to bind data";

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub status: &'static str,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            status: "success",
            data: Some(data),
        }
    }

    /// Success with `null` data.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "success",
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "error",
            data: None,
        }
    }
}

/// JSON body whose rejection is reported in the error envelope.
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                debug!(error = %rejection, "Rejected request body");
                Err(ApiError::validation(BIND_FAILED))
            }
        }
    }
}

//! HTTP surface of the dashboard.
//!
//! Every response uses the [`ApiResponse`] envelope; failures are mapped to
//! status codes by [`ApiError`].

pub mod app;
pub mod envelope;
pub mod handlers;
pub mod state;

pub use app::build_router;
pub use envelope::{ApiResponse, DeletedRecord};
pub use state::AppState;

use crate::core::StoreError;
use crate::domain::ValidationError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

pub const PROJECT_NOT_FOUND: &str = "Project not found";
pub const STORAGE_FAILURE_MESSAGE: &str = "internal storage error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationError::new(
            crate::domain::validation::BODY_FIELD,
            rejection.body_text(),
        ))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Validation(err) => err.to_string(),
            Self::NotFound(message) => message,
            Self::Storage(err) => {
                error!(error = %err, "storage operation failed");
                STORAGE_FAILURE_MESSAGE.to_string()
            }
        };

        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_maps_to_bad_request() {
        let (status, body) =
            body_of(ValidationError::new("name", "Name must be at least 3 characters").into())
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "error": "name: Name must be at least 3 characters"})
        );
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, body) = body_of(ApiError::not_found(PROJECT_NOT_FOUND)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], PROJECT_NOT_FOUND);
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn storage_details_stay_out_of_the_response() {
        let (status, body) =
            body_of(StoreError::Unavailable("disk on fire".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], STORAGE_FAILURE_MESSAGE);
    }
}

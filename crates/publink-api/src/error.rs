//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use publink_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Response wrapper around [`AppError`].
///
/// The coherence rules forbid implementing `IntoResponse` (axum) for
/// `AppError` (publink-core) here, so handlers return this newtype and
/// `?` converts through the `From` impl.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        // Anonymous link recipients never see storage-layer detail.
        let (status, error_code, message) = match &err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.message.clone()),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", err.message.clone()),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", err.message.clone()),
            ErrorKind::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                "Operation timed out".to_string(),
            ),
            ErrorKind::Storage | ErrorKind::ExternalService => {
                tracing::error!(error = %err, "Upstream service error");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Upstream service error".to_string(),
                )
            }
            ErrorKind::Serialization | ErrorKind::Configuration | ErrorKind::Internal => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors a handler can surface to a client.
///
/// Sync problems never appear here; the coordinator absorbs them into
/// response metadata. The store read is the one hard-failure path.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token.
    Unauthorized,
    /// Request-scoped server failure; detail stays in the logs.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Missing or invalid authentication token".to_string())
            }
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

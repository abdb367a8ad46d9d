//! HTTP error mapping.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use store::StoreError;
use tracing::warn;

/// Request failures mapped to HTTP statuses. Upstream AI degradation never
/// appears here: the gateway absorbs it and chat answers 200 regardless.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or conflicting input (400).
    Validation(String),

    /// Bad credentials or invalid/missing token (401).
    Auth(String),

    /// Record not found (404).
    NotFound(String),

    /// Unexpected failure (500), reported with a generic message.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Auth(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => {
                warn!(%message, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = serde_json::json!({ "message": message });
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken(_) => {
                ApiError::Validation("email already registered".to_string())
            }
            StoreError::NotFound { .. } => ApiError::NotFound("user not found".to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => ApiError::Auth("invalid or expired token".to_string()),
            AuthError::GoogleRejected(_) => ApiError::Auth("invalid Google token".to_string()),
            AuthError::NotConfigured => {
                ApiError::Internal("Google login not configured".to_string())
            }
            AuthError::Encoding(_) | AuthError::Network(_) => {
                ApiError::Internal("authentication service error".to_string())
            }
        }
    }
}

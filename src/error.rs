//! Authentication Error Types
//!
//! Centralized error handling for all authentication operations.

use crate::models::UniqueField;
use crate::store::StoreError;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Authentication errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{}", conflict_message(.0))]
    Conflict(Vec<UniqueField>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error")]
    Internal,
}

impl AuthError {
    /// Coarse 401 used wherever the failing check must not be revealed
    pub fn unauthorized() -> Self {
        AuthError::Unauthorized("Unauthorized".to_string())
    }
}

fn conflict_message(fields: &[UniqueField]) -> String {
    match fields {
        [UniqueField::Username] => "username not available, use a different username".to_string(),
        [UniqueField::Email] => "email already registered, use a different email".to_string(),
        _ => "username and email are already in use".to_string(),
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AuthError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
            ),
            AuthError::Conflict(fields) => {
                return (
                    StatusCode::CONFLICT,
                    Json(serde_json::json!({
                        "error": "conflict",
                        "message": self.to_string(),
                        "fields": fields,
                    })),
                )
                    .into_response();
            }
            AuthError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                msg.clone(),
            ),
            AuthError::Config(_) | AuthError::Database(_) | AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        (
            status,
            Json(serde_json::json!({
                "error": error_code,
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(fields) => AuthError::Conflict(fields),
            StoreError::Backend(msg) => {
                tracing::error!("Store error: {}", msg);
                AuthError::Database(msg)
            }
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        tracing::error!("Password hashing error: {:?}", err);
        AuthError::Internal
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("JWT error: {:?}", err);
        AuthError::unauthorized()
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {:?}", rejection);
        AuthError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}

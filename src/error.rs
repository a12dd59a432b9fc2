// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authorized: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Provider email is not verified")]
    UnverifiedEmail,

    #[error("OAuth provider error: {0}")]
    OAuthProvider(String),

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, Vec<String>>>,
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) | AppError::UnverifiedEmail => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::OAuthProvider(_) | AppError::ObjectStore(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Flatten validator errors into `field -> [messages]`.
///
/// Nested list errors (e.g. a single tag) are reported under `field[index]`.
pub fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    use validator::ValidationErrorsKind;

    let mut out = BTreeMap::new();
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value ({})", e.code))
                    })
                    .collect();
                out.insert(field.to_string(), messages);
            }
            ValidationErrorsKind::Struct(inner) => {
                for (nested, messages) in field_messages(inner) {
                    out.insert(format!("{}.{}", field, nested), messages);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    for (nested, messages) in field_messages(inner) {
                        out.insert(format!("{}[{}].{}", field, index, nested), messages);
                    }
                }
            }
        }
    }
    out
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details, fields) = match &self {
            AppError::Unauthorized => ("unauthorized", None, None),
            AppError::InvalidToken => ("invalid_token", None, None),
            AppError::InvalidCredentials => {
                ("invalid_credentials", Some("Invalid Credentials".to_string()), None)
            }
            AppError::Forbidden(msg) => ("forbidden", Some(msg.clone()), None),
            AppError::NotFound(msg) => ("not_found", Some(msg.clone()), None),
            AppError::BadRequest(msg) => ("bad_request", Some(msg.clone()), None),
            AppError::Validation(errors) => {
                ("validation_error", None, Some(field_messages(errors)))
            }
            AppError::Conflict(msg) => ("conflict", Some(msg.clone()), None),
            AppError::PayloadTooLarge(msg) => ("payload_too_large", Some(msg.clone()), None),
            AppError::UnverifiedEmail => ("unverified_email", None, None),
            AppError::OAuthProvider(msg) => {
                tracing::warn!(error = %msg, "OAuth provider error");
                ("oauth_error", None, None)
            }
            AppError::ObjectStore(msg) => {
                tracing::warn!(error = %msg, "Object store error");
                ("storage_error", Some("File upload failed".to_string()), None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("database_error", None, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("internal_error", None, None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

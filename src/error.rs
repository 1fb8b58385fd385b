//! Error types and HTTP response mapping.
//!
//! Every handler and extractor returns `AppError` on failure; the `IntoResponse`
//! implementation is the only place that decides status codes and error bodies.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

/// AppError
///
/// The request-level error taxonomy. Client errors carry the message returned in
/// the `detail` field; server errors are logged and replaced by a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input that is not tied to a single field (400).
    #[error("{0}")]
    Validation(String),

    /// Field-level validation failures, reported as `{"field": ["message"]}` (400).
    #[error(transparent)]
    FieldErrors(#[from] ValidationErrors),

    /// Bad credentials or an unusable token (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Missing credentials, or authenticated but not the record's author (403).
    #[error("{0}")]
    AccessDenied(String),

    /// The referenced id does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Database driver error (500).
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Any other server-side failure (500).
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found() -> Self {
        Self::NotFound("Not found.".to_string())
    }

    pub fn permission_denied() -> Self {
        Self::AccessDenied("You do not have permission to perform this action.".to_string())
    }

    pub fn not_authenticated() -> Self {
        Self::AccessDenied("Authentication credentials were not provided.".to_string())
    }

    /// A single-field validation failure, shaped like the derived ones.
    pub fn field(field: &'static str, code: &'static str, message: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, validation_error(code, message));
        Self::FieldErrors(errors)
    }
}

/// Builds a `ValidationError` carrying a client-facing message.
pub fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Body parsing failures surface as validation errors instead of axum's plain-text
/// rejections, so clients always receive JSON.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("path rejected: {}", rejection.body_text());
        Self::not_found()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::FieldErrors(errors) => {
                return (StatusCode::BAD_REQUEST, Json(field_error_map(&errors))).into_response();
            }
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::AccessDenied(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

/// Flattens `ValidationErrors` into `field -> [messages]`, falling back to the
/// error code when a rule carries no message.
pub fn field_error_map(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => e.code.to_string(),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

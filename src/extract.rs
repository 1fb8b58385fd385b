use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// ApiJson
///
/// Drop-in replacement for `axum::Json` on request bodies: identical parsing, but a
/// missing content type or malformed body is rejected with `AppError::Validation`
/// so the client gets the same JSON error shape as every other 400.
///
/// Handlers that must check existence and authorship first take
/// `Result<ApiJson<T>, AppError>` and apply `?` after those checks.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// ApiPath
///
/// `axum::extract::Path` with an `AppError` rejection. An id segment that does not
/// parse (`/api/posts/abc/`) names no record, so it is a JSON 404.
#[derive(Debug, Clone, Copy, Default, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

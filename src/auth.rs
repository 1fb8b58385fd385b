use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    repository::RepositoryState,
    token::{TokenIssuer, TokenKind},
};

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers use `id` as the
/// author of anything they create and as the requester in the authorization rule.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's `FromRequestParts`, so any handler taking an `AuthUser`
/// argument is protected. The process is:
/// 1. Dependency Resolution: the repository and token issuer from the app state.
/// 2. Token Extraction: a `Bearer` token from the `Authorization` header. A missing
///    header, or one using another scheme, means no credentials were provided.
/// 3. Token Validation: signature, expiry, and that it is an access token.
/// 4. DB Lookup: the user named by the token must still exist.
///
/// Rejection: `AccessDenied` (403) without credentials, `Unauthorized` (401) when
/// the credentials are present but unusable.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenIssuer: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let tokens = TokenIssuer::from_ref(state);

        // 2. Token Extraction
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(AppError::not_authenticated)?;

        // 3. Decode and Validate the Token
        let claims = tokens.verify(token, TokenKind::Access)?;

        // 4. Database Lookup (Final Verification)
        // Rejects tokens of users deleted after the token was issued.
        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::AppError,
    models::{AccessToken, TokenPair},
};

/// TokenKind
///
/// Distinguishes the two halves of a token pair. A refresh token is never accepted
/// as a bearer credential, and an access token is never accepted for refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims
///
/// Payload carried by both access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    /// Expiration time (seconds since the epoch).
    pub exp: usize,
    /// Issued at (seconds since the epoch).
    pub iat: usize,
    /// Unique token id, so two tokens issued in the same second still differ.
    pub jti: Uuid,
    pub token_type: TokenKind,
}

/// TokenIssuer
///
/// Issues, validates and refreshes HS256 tokens. Built once from `AppConfig` and
/// shared through `AppState`.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::seconds(config.access_token_ttl_secs),
            Duration::seconds(config.refresh_token_ttl_secs),
        )
    }

    /// Issues a fresh access/refresh pair for a user who just proved their credentials.
    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            refresh: self.sign(user_id, TokenKind::Refresh, self.refresh_ttl)?,
            access: self.sign(user_id, TokenKind::Access, self.access_ttl)?,
        })
    }

    /// Exchanges a valid refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AppError> {
        let claims = self
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AppError::Unauthorized("Token is invalid or expired".to_string()))?;

        Ok(AccessToken {
            access: self.sign(claims.sub, TokenKind::Access, self.access_ttl)?,
        })
    }

    /// Decodes a token, checking signature, expiry and kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!("token rejected: {:?}", e.kind());
            invalid_token()
        })?;

        if data.claims.token_type != expected {
            return Err(invalid_token());
        }

        Ok(data.claims)
    }

    fn sign(&self, user_id: Uuid, kind: TokenKind, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal("Token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp() as usize,
            exp: expires.timestamp() as usize,
            jti: Uuid::new_v4(),
            token_type: kind,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
    }
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Given token not valid for any token type".to_string())
}

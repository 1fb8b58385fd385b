use axum::{Json, extract::State, http::StatusCode};
use validator::{Validate, ValidationErrors};

use crate::{
    AppState,
    error::{AppError, validation_error},
    extract::ApiJson,
    models::{
        AccessToken, LoginRequest, MessageResponse, NewUser, RefreshRequest, RegisterRequest,
        TokenPair,
    },
    password::{hash_password, verify_password},
};

const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

// Letters, digits and @/./+/-/_ only.
fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

// Derived rules plus the username character set, collected into one error map.
fn validate_registration(payload: &RegisterRequest) -> Result<(), ValidationErrors> {
    let mut errors = payload.validate().err().unwrap_or_else(ValidationErrors::new);

    if let Some(username) = &payload.username {
        if !is_valid_username(username) {
            errors.add(
                "username",
                validation_error(
                    "invalid",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                ),
            );
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn bad_credentials() -> AppError {
    AppError::Unauthorized("No active account found with the given credentials".to_string())
}

/// register
///
/// [Public Route] Creates a user account.
///
/// *Flow*: validates every field, rejects a taken username, hashes the password
/// with Argon2id and inserts the user. The insert itself is conflict-safe, so two
/// racing registrations for one username yield exactly one user.
#[utoipa::path(
    post,
    path = "/api/auth/register/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = MessageResponse),
        (status = 400, description = "Field errors")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    validate_registration(&payload)?;

    let username = payload.username.unwrap_or_default();
    if state.repo.get_credentials(&username).await?.is_some() {
        return Err(AppError::field("username", "unique", DUPLICATE_USERNAME));
    }

    let password_hash = hash_password(&payload.password.unwrap_or_default())?;
    let new_user = NewUser {
        username,
        email: payload.email.unwrap_or_default(),
        password_hash,
    };

    let user = state
        .repo
        .create_user(new_user)
        .await?
        .ok_or_else(|| AppError::field("username", "unique", DUPLICATE_USERNAME))?;
    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges a username and password for an access/refresh pair.
/// Unknown users and wrong passwords are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/auth/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    payload.validate()?;

    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let credentials = state
        .repo
        .get_credentials(&username)
        .await?
        .ok_or_else(bad_credentials)?;

    if !verify_password(&password, &credentials.password_hash)? {
        tracing::debug!(%username, "login rejected: wrong password");
        return Err(bad_credentials());
    }

    let pair = state.tokens.issue_pair(credentials.id)?;
    tracing::info!(user_id = %credentials.id, "login succeeded");

    Ok(Json(pair))
}

/// refresh
///
/// [Public Route] Exchanges a refresh token for a new access token.
#[utoipa::path(
    post,
    path = "/api/auth/login/refresh/",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessToken),
        (status = 400, description = "Field errors"),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<AccessToken>, AppError> {
    payload.validate()?;

    let refresh_token = payload.refresh.unwrap_or_default();
    Ok(Json(state.tokens.refresh(&refresh_token)?))
}

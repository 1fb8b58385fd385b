use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Core Records (Mapped to Database) ---

/// User
///
/// Public view of a row in the `users` table. The password hash lives in
/// `UserCredentials` and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    // Empty when the user registered without one.
    pub email: String,
    #[ts(type = "string")]
    pub date_joined: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used by login only.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: String,
}

/// NewUser
///
/// Insert payload for the `users` table, built by the registration handler after
/// validation and hashing.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Post
///
/// A homework post from the `posts` table, joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    // FK to users.id. Set from the authenticated caller, never from the body.
    pub author: Uuid,
    pub author_username: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Comment
///
/// A row from the `comments` table, joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author: Uuid,
    pub author_username: String,
    // Id of the post this comment was created on. Checked only at insert time.
    pub post: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// NewPost
///
/// Validated insert payload for the `posts` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

// --- Request Payloads (Input Schemas) ---

/// PostRequest
///
/// Full payload for POST /api/posts/ and PUT /api/posts/{id}/.
/// Any `id`, `author` or `created_at` keys in the body are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct PostRequest {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters.")
    )]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub content: Option<String>,
}

impl From<PostRequest> for NewPost {
    fn from(req: PostRequest) -> Self {
        Self {
            title: req.title.unwrap_or_default(),
            content: req.content.unwrap_or_default(),
        }
    }
}

/// PostPatch
///
/// Partial update payload (PATCH /api/posts/{id}/). Absent fields keep their
/// stored value; present fields are validated like `PostRequest`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Ensure this field has between 1 and 200 characters."))]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub content: Option<String>,
}

impl From<NewPost> for PostPatch {
    fn from(post: NewPost) -> Self {
        Self {
            title: Some(post.title),
            content: Some(post.content),
        }
    }
}

/// CommentRequest
///
/// Payload for POST /api/comments/ and PUT /api/comments/{id}/.
/// `post` is required on create and ignored on update.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CommentRequest {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub content: Option<String>,

    /// Post id as a number or a numeric string. Blank counts as absent.
    #[serde(default, deserialize_with = "id_from_int_or_str")]
    #[ts(type = "number | string | null")]
    #[schema(value_type = Option<i64>)]
    pub post: Option<i64>,
}

/// CommentPatch
///
/// Partial update payload (PATCH /api/comments/{id}/).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CommentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub content: Option<String>,
}

/// RegisterRequest
///
/// Input payload for POST /api/auth/register/. Not `Serialize` or `Debug`, so the
/// password cannot end up in a response or a log line.
#[derive(Clone, Deserialize, ToSchema, Validate, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters.")
    )]
    pub username: Option<String>,

    /// Optional. A blank string is treated as absent.
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 8, message = "This password is too short. It must contain at least 8 characters.")
    )]
    pub password: Option<String>,
}

/// LoginRequest
///
/// Credentials for POST /api/auth/login/.
#[derive(Clone, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub username: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub password: Option<String>,
}

/// RefreshRequest
///
/// Body of POST /api/auth/login/refresh/.
#[derive(Debug, Clone, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub refresh: Option<String>,
}

// --- Response Payloads (Output Schemas) ---

/// TokenPair
///
/// Login response: a short-lived access token and a longer-lived refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// AccessToken
///
/// Refresh response carrying a newly issued access token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessToken {
    pub access: String,
}

/// MessageResponse
///
/// Plain acknowledgement body, e.g. after registration.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn id_from_int_or_str<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Int(i64),
        Str(String),
    }

    match Option::<IdRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IdRepr::Int(id)) => Ok(Some(id)),
        Some(IdRepr::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(IdRepr::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid post id `{s}`"))),
    }
}

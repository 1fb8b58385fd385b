use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use validator::Validate;

use crate::{
    AppState,
    auth::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiPath},
    models::{NewPost, Post, PostPatch, PostRequest},
    permissions::{Access, authorize},
};

// Loads a post or fails with 404. Runs before the author check.
async fn load_post(state: &AppState, id: i64) -> Result<Post, AppError> {
    state.repo.get_post(id).await?.ok_or_else(AppError::not_found)
}

/// list_posts
///
/// [Public Route] Lists every post, newest first. No pagination or filtering.
#[utoipa::path(
    get,
    path = "/api/posts/",
    responses((status = 200, description = "All posts, newest first", body = [Post]))
)]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    Ok(Json(state.repo.list_posts().await?))
}

/// retrieve_post
///
/// [Public Route] Returns a single post by id.
#[utoipa::path(
    get,
    path = "/api/posts/{id}/",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn retrieve_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Post>, AppError> {
    load_post(&state, id).await.map(Json)
}

/// create_post
///
/// [Authenticated Route] Creates a post. The author is always the caller; an
/// `author` key in the body is ignored.
#[utoipa::path(
    post,
    path = "/api/posts/",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Field errors"),
        (status = 403, description = "No credentials")
    )
)]
pub async fn create_post(
    AuthUser { id: author, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PostRequest>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    payload.validate()?;

    let post = state.repo.create_post(author, NewPost::from(payload)).await?;
    tracing::info!(post_id = post.id, %author, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Author Only] Replaces the title and content of a post (PUT).
/// Existence is checked first (404), then authorship (403), then the body (400).
#[utoipa::path(
    put,
    path = "/api/posts/{id}/",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    payload: Result<ApiJson<PostRequest>, AppError>,
) -> Result<Json<Post>, AppError> {
    let existing = load_post(&state, id).await?;
    authorize(Access::Write, &user, &existing)?;
    let ApiJson(payload) = payload?;
    payload.validate()?;

    let changes = PostPatch::from(NewPost::from(payload));
    apply_update(&state, id, changes).await
}

/// partial_update_post
///
/// [Author Only] Updates only the fields present in the body (PATCH).
#[utoipa::path(
    patch,
    path = "/api/posts/{id}/",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostPatch,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_post(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    payload: Result<ApiJson<PostPatch>, AppError>,
) -> Result<Json<Post>, AppError> {
    let existing = load_post(&state, id).await?;
    authorize(Access::Write, &user, &existing)?;
    let ApiJson(payload) = payload?;
    payload.validate()?;

    apply_update(&state, id, payload).await
}

/// delete_post
///
/// [Author Only] Deletes a post. Its comments are left in place.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}/",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    let existing = load_post(&state, id).await?;
    authorize(Access::Write, &user, &existing)?;

    if !state.repo.delete_post(id).await? {
        // Deleted by a concurrent request between the check and the write.
        return Err(AppError::not_found());
    }
    tracing::info!(post_id = id, author = %user.id, "post deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(state: &AppState, id: i64, changes: PostPatch) -> Result<Json<Post>, AppError> {
    state
        .repo
        .update_post(id, changes)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

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
    models::{Comment, CommentPatch, CommentRequest},
    permissions::{Access, authorize},
};

async fn load_comment(state: &AppState, id: i64) -> Result<Comment, AppError> {
    state.repo.get_comment(id).await?.ok_or_else(AppError::not_found)
}

/// list_comments
///
/// [Authenticated Route] Lists every comment, newest first.
#[utoipa::path(
    get,
    path = "/api/comments/",
    responses(
        (status = 200, description = "All comments, newest first", body = [Comment]),
        (status = 403, description = "No credentials")
    )
)]
pub async fn list_comments(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Comment>>, AppError> {
    Ok(Json(state.repo.list_comments().await?))
}

/// retrieve_comment
///
/// [Authenticated Route] Returns a single comment by id.
#[utoipa::path(
    get,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Found", body = Comment),
        (status = 404, description = "Not Found")
    )
)]
pub async fn retrieve_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Comment>, AppError> {
    let comment = load_comment(&state, id).await?;
    authorize(Access::Read, &user, &comment)?;
    Ok(Json(comment))
}

/// create_comment
///
/// [Authenticated Route] Comments on the post named by `post` in the body.
///
/// Checks run in order: `content` field errors (400), `post` missing (400),
/// `post` not matching an existing post (404).
#[utoipa::path(
    post,
    path = "/api/comments/",
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 400, description = "Missing content or post id"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn create_comment(
    AuthUser { id: author, .. }: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    payload.validate()?;

    let post_id = payload
        .post
        .ok_or_else(|| AppError::Validation("Post ID is required.".to_string()))?;

    let post = state
        .repo
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found.".to_string()))?;

    let content = payload.content.unwrap_or_default();
    let comment = state.repo.create_comment(author, post.id, content).await?;
    tracing::info!(comment_id = comment.id, post_id = post.id, %author, "comment created");

    Ok((StatusCode::CREATED, Json(comment)))
}

/// update_comment
///
/// [Author Only] Replaces the content of a comment (PUT). The `post` key is
/// ignored: a comment never moves to another post.
#[utoipa::path(
    put,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    payload: Result<ApiJson<CommentRequest>, AppError>,
) -> Result<Json<Comment>, AppError> {
    let existing = load_comment(&state, id).await?;
    authorize(Access::Write, &user, &existing)?;
    let ApiJson(payload) = payload?;
    payload.validate()?;

    let changes = CommentPatch {
        content: payload.content,
    };
    apply_update(&state, id, changes).await
}

/// partial_update_comment
///
/// [Author Only] PATCH variant of `update_comment`; an empty body is a no-op.
#[utoipa::path(
    patch,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentPatch,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    payload: Result<ApiJson<CommentPatch>, AppError>,
) -> Result<Json<Comment>, AppError> {
    let existing = load_comment(&state, id).await?;
    authorize(Access::Write, &user, &existing)?;
    let ApiJson(payload) = payload?;
    payload.validate()?;

    apply_update(&state, id, payload).await
}

/// delete_comment
///
/// [Author Only] Deletes a comment.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    let existing = load_comment(&state, id).await?;
    authorize(Access::Write, &user, &existing)?;

    if !state.repo.delete_comment(id).await? {
        return Err(AppError::not_found());
    }
    tracing::info!(comment_id = id, author = %user.id, "comment deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(
    state: &AppState,
    id: i64,
    changes: CommentPatch,
) -> Result<Json<Comment>, AppError> {
    state
        .repo
        .update_comment(id, changes)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

use crate::{AppState, handlers::posts};
use axum::{Router, routing::get};

/// Post Router Module
///
/// Mounted under `/api`. Reads are anonymous; handlers that take an `AuthUser`
/// (create, update, delete) reject callers without a valid access token.
pub fn post_routes() -> Router<AppState> {
    Router::new()
        // GET  /api/posts/  newest first, anyone
        // POST /api/posts/  authenticated, author forced to the caller
        .route("/posts/", get(posts::list_posts).post(posts::create_post))
        // GET /api/posts/{id}/ anyone; PUT/PATCH/DELETE author only
        .route(
            "/posts/{id}/",
            get(posts::retrieve_post)
                .put(posts::update_post)
                .patch(posts::partial_update_post)
                .delete(posts::delete_post),
        )
}

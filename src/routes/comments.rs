use crate::{AppState, handlers::comments};
use axum::{Router, routing::get};

/// Comment Router Module
///
/// Mounted under `/api` behind the authentication layer. Creation requires a
/// `post` id in the body that names an existing post.
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/comments/",
            get(comments::list_comments).post(comments::create_comment),
        )
        // PUT/PATCH/DELETE are author only, checked in the handlers.
        .route(
            "/comments/{id}/",
            get(comments::retrieve_comment)
                .put(comments::update_comment)
                .patch(comments::partial_update_comment)
                .delete(comments::delete_comment),
        )
}

use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that never look at credentials.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Static map of the available endpoint paths.
        .route("/", get(handlers::api_root))
        // GET /health
        // Monitoring and load balancer check. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
}

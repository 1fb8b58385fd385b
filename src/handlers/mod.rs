//! Request handlers, one module per resource.
//!
//! Every handler returns `Result<_, AppError>`; identity comes from the `AuthUser`
//! extractor and request bodies from `ApiJson`.

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod accounts;
pub mod comments;
pub mod posts;

/// ApiRoot
///
/// Static discovery document served at `/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiRoot {
    pub message: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Endpoints {
    pub auth: String,
    pub register: String,
    pub login: String,
    pub posts: String,
    pub comments: String,
}

/// api_root
///
/// [Public Route] Lists the available endpoint paths. No state, no side effects.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Endpoint map", body = ApiRoot))
)]
pub async fn api_root() -> Json<ApiRoot> {
    Json(ApiRoot {
        message: "Welcome to the E gram API!".to_string(),
        endpoints: Endpoints {
            auth: "/api/auth/".to_string(),
            register: "/api/auth/register/".to_string(),
            login: "/api/auth/login/".to_string(),
            posts: "/api/posts/".to_string(),
            comments: "/api/comments/".to_string(),
        },
    })
}

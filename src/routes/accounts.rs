use crate::{AppState, handlers::accounts};
use axum::{Router, routing::post};

/// Account Router Module
///
/// Mounted under `/api`. All three endpoints are anonymous: they are how a
/// client obtains credentials in the first place.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register/", post(accounts::register))
        // Returns {"refresh", "access"}.
        .route("/auth/login/", post(accounts::login))
        // Bears a refresh token, returns {"access"}.
        .route("/auth/login/refresh/", post(accounts::refresh))
}

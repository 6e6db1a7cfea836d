//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login       -> login
/// POST /refresh     -> refresh
/// POST /logout      -> logout (requires auth)
/// GET  /me          -> me (requires auth)
/// GET  /me/profile  -> my_profile
/// PUT  /me/profile  -> update_my_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route(
            "/me/profile",
            get(auth::my_profile).put(auth::update_my_profile),
        )
}

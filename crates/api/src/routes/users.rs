//! Route definitions for admin user management, mounted at `/admin/users`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/admin/users` (all admin only).
///
/// ```text
/// GET    /                      -> list_users
/// POST   /                      -> create_user
/// GET    /{id}                  -> get_user
/// PUT    /{id}                  -> update_user
/// DELETE /{id}                  -> deactivate_user
/// POST   /{id}/reset-password   -> reset_password
/// GET    /{id}/profile          -> get_profile
/// PUT    /{id}/profile          -> update_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
        .route("/{id}/reset-password", post(users::reset_password))
        .route(
            "/{id}/profile",
            get(users::get_profile).put(users::update_profile),
        )
}

//! Route definitions for the supervised control workflow.
//!
//! Three routers are provided:
//! - `router()` for control state CRUD and the change workflow, mounted at
//!   `/control-states`
//! - `requests_router()` for change request listing, mounted at
//!   `/control-requests`
//! - `permissions_router()` for permission grants, mounted at
//!   `/control-permissions`

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::controls;
use crate::state::AppState;

/// Routes mounted at `/control-states`.
///
/// ```text
/// GET    /                          -> list_controls (?station=&search=)
/// POST   /                          -> create_control (admin only)
/// POST   /confirm-change            -> confirm_change (admin only)
/// GET    /{id}                      -> get_control
/// PUT    /{id}                      -> update_control (admin only)
/// DELETE /{id}                      -> delete_control (admin only)
/// POST   /{id}/request-change       -> request_change
/// GET    /{id}/history              -> control_history (last 50 entries)
/// POST   /requests/{id}/cancel      -> cancel_request (requester or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(controls::list_controls).post(controls::create_control),
        )
        .route("/confirm-change", post(controls::confirm_change))
        .route(
            "/{id}",
            get(controls::get_control)
                .put(controls::update_control)
                .delete(controls::delete_control),
        )
        .route("/{id}/request-change", post(controls::request_change))
        .route("/{id}/history", get(controls::control_history))
        .route("/requests/{id}/cancel", post(controls::cancel_request))
}

/// Routes mounted at `/control-requests`.
///
/// ```text
/// GET /  -> list_requests (own requests; admins see all)
/// ```
pub fn requests_router() -> Router<AppState> {
    Router::new().route("/", get(controls::list_requests))
}

/// Routes mounted at `/control-permissions` (all admin only).
///
/// ```text
/// GET    /      -> list_permissions
/// POST   /      -> grant_permission
/// DELETE /{id}  -> revoke_permission
/// ```
pub fn permissions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(controls::list_permissions).post(controls::grant_permission),
        )
        .route("/{id}", axum::routing::delete(controls::revoke_permission))
}

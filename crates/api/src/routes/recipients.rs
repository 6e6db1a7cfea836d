//! Route definitions for the `/notification-recipients` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::recipients;
use crate::state::AppState;

/// Routes mounted at `/notification-recipients`.
///
/// ```text
/// GET    /      -> list_recipients (operator or admin)
/// POST   /      -> create_recipient (admin only)
/// PUT    /{id}  -> update_recipient (admin only)
/// DELETE /{id}  -> delete_recipient (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(recipients::list_recipients).post(recipients::create_recipient),
        )
        .route(
            "/{id}",
            put(recipients::update_recipient).delete(recipients::delete_recipient),
        )
}

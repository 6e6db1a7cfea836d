//! Route definitions for the `/tags` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Routes mounted at `/tags`.
///
/// ```text
/// GET    /      -> list_tags
/// POST   /      -> create_tag (operator or admin)
/// DELETE /{id}  -> delete_tag (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::list_tags).post(tags::create_tag))
        .route("/{id}", delete(tags::delete_tag))
}

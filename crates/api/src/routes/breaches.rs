//! Route definitions for the `/breaches` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::breaches;
use crate::state::AppState;

/// Routes mounted at `/breaches`.
///
/// ```text
/// GET  /                    -> list_breaches (?node=&station=&level=&acknowledged=)
/// GET  /unacknowledged      -> list_unacknowledged
/// GET  /recent              -> list_recent (?hours=)
/// POST /{id}/acknowledge    -> acknowledge_breach (operator or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(breaches::list_breaches))
        .route("/unacknowledged", get(breaches::list_unacknowledged))
        .route("/recent", get(breaches::list_recent))
        .route("/{id}/acknowledge", post(breaches::acknowledge_breach))
}

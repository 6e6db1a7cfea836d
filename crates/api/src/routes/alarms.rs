//! Route definitions for the `/alarms` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::alarms;
use crate::state::AppState;

/// Routes mounted at `/alarms`.
///
/// ```text
/// GET  /                  -> list_alarms (?station=&severity=&acknowledged=)
/// POST /{id}/acknowledge  -> acknowledge_alarm (operator or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alarms::list_alarms))
        .route("/{id}/acknowledge", post(alarms::acknowledge_alarm))
}

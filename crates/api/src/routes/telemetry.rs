//! Route definitions for the `/telemetry` export endpoint.

use axum::routing::get;
use axum::Router;

use crate::handlers::telemetry;
use crate::state::AppState;

/// Routes mounted at `/telemetry`.
///
/// ```text
/// GET /  -> list_telemetry (?station=&from=&to=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(telemetry::list_telemetry))
}

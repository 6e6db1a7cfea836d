//! Route definitions for the `/thresholds` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::thresholds;
use crate::state::AppState;

/// Routes mounted at `/thresholds`. The path parameter is a node id;
/// thresholds live on nodes.
///
/// ```text
/// GET /                          -> list_thresholds (?station=&search=)
/// PUT /{node_id}                 -> update_thresholds (admin only)
/// GET /{node_id}/breaches        -> node_breaches
/// GET /{node_id}/breaches/stats  -> node_breach_stats (last 24h)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(thresholds::list_thresholds))
        .route(
            "/{node_id}",
            axum::routing::put(thresholds::update_thresholds),
        )
        .route("/{node_id}/breaches", get(thresholds::node_breaches))
        .route(
            "/{node_id}/breaches/stats",
            get(thresholds::node_breach_stats),
        )
}

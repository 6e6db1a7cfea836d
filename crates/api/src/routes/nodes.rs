//! Route definitions for the `/nodes` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::nodes;
use crate::state::AppState;

/// Routes mounted at `/nodes`.
///
/// ```text
/// GET    /             -> list_nodes (?station=&alarms_enabled=&active=&search=)
/// POST   /             -> create_node (admin only)
/// GET    /{id}         -> get_node
/// PUT    /{id}         -> update_node (admin only)
/// DELETE /{id}         -> delete_node (admin only)
/// GET    /{id}/value   -> node_value
/// POST   /{id}/write   -> write_node (operator or admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(nodes::list_nodes).post(nodes::create_node))
        .route(
            "/{id}",
            get(nodes::get_node)
                .put(nodes::update_node)
                .delete(nodes::delete_node),
        )
        .route("/{id}/value", get(nodes::node_value))
        .route("/{id}/write", post(nodes::write_node))
}

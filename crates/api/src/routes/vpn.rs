//! Route definitions for the `/vpn-clients` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::vpn;
use crate::state::AppState;

/// Routes mounted at `/vpn-clients` (all admin only).
///
/// ```text
/// GET    /         -> list_clients
/// POST   /         -> create_client
/// GET    /summary  -> status_summary
/// GET    /{id}     -> get_client
/// PUT    /{id}     -> update_client
/// DELETE /{id}     -> delete_client
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(vpn::list_clients).post(vpn::create_client))
        .route("/summary", get(vpn::status_summary))
        .route(
            "/{id}",
            get(vpn::get_client)
                .put(vpn::update_client)
                .delete(vpn::delete_client),
        )
}

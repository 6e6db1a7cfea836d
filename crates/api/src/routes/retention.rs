//! Route definitions for the `/retention-policy` singleton resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::retention;
use crate::state::AppState;

/// Routes mounted at `/retention-policy`.
///
/// ```text
/// GET /  -> get_policy
/// PUT /  -> update_policy (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(retention::get_policy).put(retention::update_policy))
}

//! Route definitions for the `/stations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::stations;
use crate::state::AppState;

/// Routes mounted at `/stations`.
///
/// ```text
/// GET    /           -> list_stations
/// POST   /           -> create_station (admin only)
/// GET    /summary    -> station_summary
/// GET    /uptime     -> station_uptime (?days=)
/// GET    /{id}       -> get_station
/// PUT    /{id}       -> update_station (admin only)
/// DELETE /{id}       -> delete_station (admin only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(stations::list_stations).post(stations::create_station),
        )
        .route("/summary", get(stations::station_summary))
        .route("/uptime", get(stations::station_uptime))
        .route(
            "/{id}",
            get(stations::get_station)
                .put(stations::update_station)
                .delete(stations::delete_station),
        )
}

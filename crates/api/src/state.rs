use std::sync::Arc;

use broms_poller::StationManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: broms_db::PgPool,
    /// Server configuration (JWT secret, timeouts, CORS origins).
    pub config: Arc<ServerConfig>,
    /// Station polling manager; also executes control writes.
    pub station_manager: Arc<StationManager>,
    /// Centralized event bus for publishing system events.
    pub event_bus: Arc<broms_events::bus::EventBus>,
}

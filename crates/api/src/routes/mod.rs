pub mod alarms;
pub mod auth;
pub mod breaches;
pub mod controls;
pub mod health;
pub mod nodes;
pub mod recipients;
pub mod retention;
pub mod stations;
pub mod tags;
pub mod telemetry;
pub mod thresholds;
pub mod users;
pub mod vpn;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/refresh                                refresh (public)
/// /auth/logout                                 logout (requires auth)
/// /auth/me                                     current user (GET)
/// /auth/me/profile                             own profile (GET, PUT)
///
/// /admin/users                                 list, create (admin only)
/// /admin/users/{id}                            get, update, deactivate
/// /admin/users/{id}/reset-password             reset password (POST)
/// /admin/users/{id}/profile                    get, update profile
///
/// /stations                                    list, create
/// /stations/summary                            fleet summary (GET)
/// /stations/uptime                             uptime report (GET, ?days=)
/// /stations/{id}                               get, update, delete
///
/// /tags                                        list, create
/// /tags/{id}                                   delete (admin only)
///
/// /nodes                                       list, create (?station=&search=)
/// /nodes/{id}                                  get, update, delete
/// /nodes/{id}/value                            latest value (GET)
/// /nodes/{id}/write                            direct write (POST, operator)
///
/// /telemetry                                   read log export (GET, ?station=&from=&to=)
///
/// /thresholds                                  list threshold settings (GET)
/// /thresholds/{node_id}                        update thresholds (PUT, admin)
/// /thresholds/{node_id}/breaches               breach history (GET)
/// /thresholds/{node_id}/breaches/stats         24h breach stats (GET)
///
/// /breaches                                    list (?level=&acknowledged=)
/// /breaches/unacknowledged                     open breaches (GET)
/// /breaches/recent                             recent breaches (GET, ?hours=)
/// /breaches/{id}/acknowledge                   acknowledge (POST, operator)
///
/// /alarms                                      list (?severity=&acknowledged=)
/// /alarms/{id}/acknowledge                     acknowledge (POST, operator)
///
/// /control-states                              list, create
/// /control-states/confirm-change               confirm pending request (POST, admin)
/// /control-states/{id}                         get, update, delete
/// /control-states/{id}/request-change          request a value change (POST)
/// /control-states/{id}/history                 audit trail (GET, last 50)
/// /control-states/requests/{id}/cancel         cancel pending request (POST)
/// /control-requests                            list requests (own; admin sees all)
/// /control-permissions                         list, grant (admin only)
/// /control-permissions/{id}                    revoke (DELETE, admin only)
///
/// /notification-recipients                     list, create
/// /notification-recipients/{id}                update, delete
///
/// /retention-policy                            get, update (singleton)
///
/// /vpn-clients                                 list, create (admin only)
/// /vpn-clients/summary                         fleet VPN status (GET)
/// /vpn-clients/{id}                            get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication and own-account routes.
        .nest("/auth", auth::router())
        // Admin user management.
        .nest("/admin/users", users::router())
        // Station registry and fleet reports.
        .nest("/stations", stations::router())
        // Station grouping tags.
        .nest("/tags", tags::router())
        // Monitored data points.
        .nest("/nodes", nodes::router())
        // Time-ranged read log export.
        .nest("/telemetry", telemetry::router())
        // Per-node threshold settings and breach reporting.
        .nest("/thresholds", thresholds::router())
        // Threshold breach records.
        .nest("/breaches", breaches::router())
        // Operational alarms.
        .nest("/alarms", alarms::router())
        // Supervised control workflow (request, confirm, history).
        .nest("/control-states", controls::router())
        .nest("/control-requests", controls::requests_router())
        .nest("/control-permissions", controls::permissions_router())
        // Breach notification recipients.
        .nest("/notification-recipients", recipients::router())
        // Data retention policy (singleton).
        .nest("/retention-policy", retention::router())
        // VPN client administration.
        .nest("/vpn-clients", vpn::router())
}

//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod alarm_repo;
pub mod breach_repo;
pub mod control_history_repo;
pub mod control_permission_repo;
pub mod control_repo;
pub mod control_request_repo;
pub mod node_repo;
pub mod notification_repo;
pub mod profile_repo;
pub mod retention_repo;
pub mod role_repo;
pub mod session_repo;
pub mod station_repo;
pub mod tag_repo;
pub mod telemetry_repo;
pub mod user_repo;
pub mod vpn_repo;

/// Escape LIKE/ILIKE wildcards in a user-supplied search term so that
/// `%` and `_` match literally inside a `'%' || $n || '%'` pattern.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use alarm_repo::AlarmRepo;
pub use breach_repo::BreachRepo;
pub use control_history_repo::ControlHistoryRepo;
pub use control_permission_repo::ControlPermissionRepo;
pub use control_repo::ControlRepo;
pub use control_request_repo::ControlRequestRepo;
pub use node_repo::NodeRepo;
pub use notification_repo::NotificationRepo;
pub use profile_repo::ProfileRepo;
pub use retention_repo::RetentionRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use station_repo::StationRepo;
pub use tag_repo::TagRepo;
pub use telemetry_repo::TelemetryRepo;
pub use user_repo::UserRepo;
pub use vpn_repo::VpnRepo;

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("pump_7"), "pump\\_7");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}

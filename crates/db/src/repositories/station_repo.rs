//! Repository for the `stations` table and the station connection log.

use sqlx::PgPool;

use broms_core::types::{DbId, Timestamp};

use crate::models::station::{
    ConnectionLogEntry, CreateStation, Station, StationSummary, UpdateStation,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, endpoint_url, security_policy, security_mode, \
                        auth_username, auth_password, session_timeout_ms, \
                        secure_channel_timeout_ms, connection_timeout_ms, request_timeout_ms, \
                        acknowledge_timeout_ms, subscription_interval_ms, is_active, \
                        connection_status, last_connected_at, created_at, updated_at";

/// Provides CRUD operations for stations.
pub struct StationRepo;

impl StationRepo {
    /// Insert a new station, returning the created row. Omitted timeouts
    /// take the schema defaults.
    pub async fn create(pool: &PgPool, input: &CreateStation) -> Result<Station, sqlx::Error> {
        let query = format!(
            "INSERT INTO stations (name, endpoint_url, security_policy, security_mode,
                 auth_username, auth_password,
                 session_timeout_ms, secure_channel_timeout_ms, connection_timeout_ms,
                 request_timeout_ms, acknowledge_timeout_ms, subscription_interval_ms)
             VALUES ($1, $2, $3, $4, $5, $6,
                 COALESCE($7, 60000), COALESCE($8, 10000), COALESCE($9, 5000),
                 COALESCE($10, 10000), COALESCE($11, 5000), COALESCE($12, 5000))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Station>(&query)
            .bind(&input.name)
            .bind(&input.endpoint_url)
            .bind(&input.security_policy)
            .bind(&input.security_mode)
            .bind(&input.auth_username)
            .bind(&input.auth_password)
            .bind(input.session_timeout_ms)
            .bind(input.secure_channel_timeout_ms)
            .bind(input.connection_timeout_ms)
            .bind(input.request_timeout_ms)
            .bind(input.acknowledge_timeout_ms)
            .bind(input.subscription_interval_ms)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Station>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stations WHERE id = $1");
        sqlx::query_as::<_, Station>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all stations, name order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Station>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stations ORDER BY name");
        sqlx::query_as::<_, Station>(&query).fetch_all(pool).await
    }

    /// List stations the poller should manage.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Station>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stations WHERE is_active = true ORDER BY id");
        sqlx::query_as::<_, Station>(&query).fetch_all(pool).await
    }

    /// Update a station. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStation,
    ) -> Result<Option<Station>, sqlx::Error> {
        let query = format!(
            "UPDATE stations SET
                name = COALESCE($2, name),
                endpoint_url = COALESCE($3, endpoint_url),
                security_policy = COALESCE($4, security_policy),
                security_mode = COALESCE($5, security_mode),
                auth_username = COALESCE($6, auth_username),
                auth_password = COALESCE($7, auth_password),
                session_timeout_ms = COALESCE($8, session_timeout_ms),
                secure_channel_timeout_ms = COALESCE($9, secure_channel_timeout_ms),
                connection_timeout_ms = COALESCE($10, connection_timeout_ms),
                request_timeout_ms = COALESCE($11, request_timeout_ms),
                acknowledge_timeout_ms = COALESCE($12, acknowledge_timeout_ms),
                subscription_interval_ms = COALESCE($13, subscription_interval_ms),
                is_active = COALESCE($14, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Station>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.endpoint_url)
            .bind(&input.security_policy)
            .bind(&input.security_mode)
            .bind(&input.auth_username)
            .bind(&input.auth_password)
            .bind(input.session_timeout_ms)
            .bind(input.secure_channel_timeout_ms)
            .bind(input.connection_timeout_ms)
            .bind(input.request_timeout_ms)
            .bind(input.acknowledge_timeout_ms)
            .bind(input.subscription_interval_ms)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a station and its dependent rows (FK cascade).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM stations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fleet counts for the dashboard summary.
    pub async fn summary(pool: &PgPool) -> Result<StationSummary, sqlx::Error> {
        sqlx::query_as::<_, StationSummary>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_active) AS active,
                    COUNT(*) FILTER (WHERE connection_status = 'Connected') AS connected
             FROM stations",
        )
        .fetch_one(pool)
        .await
    }

    /// Record a connection status change, updating the station row and
    /// appending to the connection log in one transaction.
    pub async fn set_connection_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
        online: bool,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "UPDATE stations SET
                connection_status = $2,
                last_connected_at = CASE WHEN $3 THEN NOW() ELSE last_connected_at END
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(online)
        .execute(&mut *tx)
        .await?;
        sqlx::query("INSERT INTO station_connection_log (station_id, online) VALUES ($1, $2)")
            .bind(id)
            .bind(online)
            .execute(&mut *tx)
            .await?;
        tx.commit().await
    }

    /// Connection log entries for a station within a window, oldest first.
    pub async fn connection_log(
        pool: &PgPool,
        station_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<ConnectionLogEntry>, sqlx::Error> {
        sqlx::query_as::<_, ConnectionLogEntry>(
            "SELECT id, station_id, online, at FROM station_connection_log
             WHERE station_id = $1 AND at >= $2 AND at <= $3
             ORDER BY at",
        )
        .bind(station_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// The last transition strictly before `at`, used to seed the uptime
    /// calculation's initial state.
    pub async fn last_transition_before(
        pool: &PgPool,
        station_id: DbId,
        at: Timestamp,
    ) -> Result<Option<ConnectionLogEntry>, sqlx::Error> {
        sqlx::query_as::<_, ConnectionLogEntry>(
            "SELECT id, station_id, online, at FROM station_connection_log
             WHERE station_id = $1 AND at < $2
             ORDER BY at DESC
             LIMIT 1",
        )
        .bind(station_id)
        .bind(at)
        .fetch_optional(pool)
        .await
    }
}

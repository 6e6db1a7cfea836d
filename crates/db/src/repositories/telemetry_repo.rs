//! Repository for the append-only `telemetry_log` table.

use sqlx::PgPool;

use broms_core::types::{DbId, Timestamp};

use crate::models::telemetry::TelemetryEntry;

const COLUMNS: &str = "id, node_id, station_id, value, recorded_at";

/// Hard cap on rows returned by a range query.
pub const MAX_RANGE_ROWS: i64 = 10_000;

/// Append and query telemetry reads.
pub struct TelemetryRepo;

impl TelemetryRepo {
    /// Append a read.
    pub async fn insert(
        pool: &PgPool,
        node_id: DbId,
        station_id: DbId,
        value: &str,
    ) -> Result<TelemetryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO telemetry_log (node_id, station_id, value)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TelemetryEntry>(&query)
            .bind(node_id)
            .bind(station_id)
            .bind(value)
            .fetch_one(pool)
            .await
    }

    /// Reads for a station within a time window, oldest first, capped at
    /// [`MAX_RANGE_ROWS`].
    pub async fn range_for_station(
        pool: &PgPool,
        station_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<TelemetryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM telemetry_log
             WHERE station_id = $1 AND recorded_at >= $2 AND recorded_at <= $3
             ORDER BY recorded_at
             LIMIT {MAX_RANGE_ROWS}"
        );
        sqlx::query_as::<_, TelemetryEntry>(&query)
            .bind(station_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// The latest read for a node, if any.
    pub async fn latest_for_node(
        pool: &PgPool,
        node_id: DbId,
    ) -> Result<Option<TelemetryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM telemetry_log
             WHERE node_id = $1
             ORDER BY recorded_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, TelemetryEntry>(&query)
            .bind(node_id)
            .fetch_optional(pool)
            .await
    }
}

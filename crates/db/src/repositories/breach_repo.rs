//! Repository for the `breaches` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::breach::{Breach, BreachFilter, BreachStats};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, node_id, station_id, level, value, threshold_value, \
                        acknowledged, acknowledged_by, acknowledged_at, created_at";

/// Provides access to threshold breach records.
pub struct BreachRepo;

impl BreachRepo {
    /// Record a breach.
    pub async fn insert(
        pool: &PgPool,
        node_id: DbId,
        station_id: DbId,
        level: &str,
        value: &str,
        threshold_value: Option<f64>,
    ) -> Result<Breach, sqlx::Error> {
        let query = format!(
            "INSERT INTO breaches (node_id, station_id, level, value, threshold_value)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Breach>(&query)
            .bind(node_id)
            .bind(station_id)
            .bind(level)
            .bind(value)
            .bind(threshold_value)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Breach>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM breaches WHERE id = $1");
        sqlx::query_as::<_, Breach>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List breaches with the optional filters applied, newest first.
    pub async fn list(pool: &PgPool, filter: &BreachFilter) -> Result<Vec<Breach>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM breaches
             WHERE ($1::bigint IS NULL OR node_id = $1)
               AND ($2::bigint IS NULL OR station_id = $2)
               AND ($3::text IS NULL OR level = $3)
               AND ($4::boolean IS NULL OR acknowledged = $4)
             ORDER BY created_at DESC
             LIMIT 500"
        );
        sqlx::query_as::<_, Breach>(&query)
            .bind(filter.node)
            .bind(filter.station)
            .bind(&filter.level)
            .bind(filter.acknowledged)
            .fetch_all(pool)
            .await
    }

    /// All unacknowledged breaches, newest first.
    pub async fn list_unacknowledged(pool: &PgPool) -> Result<Vec<Breach>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM breaches
             WHERE acknowledged = false
             ORDER BY created_at DESC
             LIMIT 500"
        );
        sqlx::query_as::<_, Breach>(&query).fetch_all(pool).await
    }

    /// Breaches raised within the last `hours` hours, newest first.
    pub async fn list_recent(pool: &PgPool, hours: i64) -> Result<Vec<Breach>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM breaches
             WHERE created_at >= NOW() - make_interval(hours => $1)
             ORDER BY created_at DESC
             LIMIT 500"
        );
        sqlx::query_as::<_, Breach>(&query)
            .bind(hours as i32)
            .fetch_all(pool)
            .await
    }

    /// Breaches for a node, newest first.
    pub async fn list_for_node(pool: &PgPool, node_id: DbId) -> Result<Vec<Breach>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM breaches
             WHERE node_id = $1
             ORDER BY created_at DESC
             LIMIT 500"
        );
        sqlx::query_as::<_, Breach>(&query)
            .bind(node_id)
            .fetch_all(pool)
            .await
    }

    /// 24-hour totals for a node's stats card.
    pub async fn stats_24h(pool: &PgPool, node_id: DbId) -> Result<BreachStats, sqlx::Error> {
        sqlx::query_as::<_, BreachStats>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE level = 'Warning') AS warning,
                    COUNT(*) FILTER (WHERE level = 'Critical') AS critical,
                    COUNT(*) FILTER (WHERE NOT acknowledged) AS unacknowledged
             FROM breaches
             WHERE node_id = $1 AND created_at >= NOW() - INTERVAL '24 hours'",
        )
        .bind(node_id)
        .fetch_one(pool)
        .await
    }

    /// Acknowledge a breach. Returns the updated row, or `None` if the
    /// breach does not exist or was already acknowledged.
    pub async fn acknowledge(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Breach>, sqlx::Error> {
        let query = format!(
            "UPDATE breaches SET
                acknowledged = true,
                acknowledged_by = $2,
                acknowledged_at = NOW()
             WHERE id = $1 AND acknowledged = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Breach>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete breaches older than `days`. When `keep_unacknowledged` is set,
    /// unacknowledged rows survive regardless of age.
    pub async fn cleanup_older_than(
        pool: &PgPool,
        days: i32,
        keep_unacknowledged: bool,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM breaches
             WHERE created_at < NOW() - make_interval(days => $1)
               AND (acknowledged = true OR $2 = false)",
        )
        .bind(days)
        .bind(keep_unacknowledged)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

//! Repository for the `alarms` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::alarm::{Alarm, AlarmFilter, CreateAlarm};

const COLUMNS: &str = "id, station_id, node_id, severity, message, \
                        acknowledged, acknowledged_by, acknowledged_at, created_at";

/// Provides access to operational alarms.
pub struct AlarmRepo;

impl AlarmRepo {
    /// Raise an alarm.
    pub async fn insert(pool: &PgPool, input: &CreateAlarm) -> Result<Alarm, sqlx::Error> {
        let query = format!(
            "INSERT INTO alarms (station_id, node_id, severity, message)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(input.station_id)
            .bind(input.node_id)
            .bind(&input.severity)
            .bind(&input.message)
            .fetch_one(pool)
            .await
    }

    /// List alarms with the optional filters applied, newest first.
    pub async fn list(pool: &PgPool, filter: &AlarmFilter) -> Result<Vec<Alarm>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alarms
             WHERE ($1::bigint IS NULL OR station_id = $1)
               AND ($2::text IS NULL OR severity = $2)
               AND ($3::boolean IS NULL OR acknowledged = $3)
             ORDER BY created_at DESC
             LIMIT 500"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(filter.station)
            .bind(&filter.severity)
            .bind(filter.acknowledged)
            .fetch_all(pool)
            .await
    }

    /// Acknowledge an alarm. Returns the updated row, or `None` if the
    /// alarm does not exist or was already acknowledged.
    pub async fn acknowledge(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Alarm>, sqlx::Error> {
        let query = format!(
            "UPDATE alarms SET
                acknowledged = true,
                acknowledged_by = $2,
                acknowledged_at = NOW()
             WHERE id = $1 AND acknowledged = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Alarm>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete alarms older than `days`. Returns the count of deleted rows.
    pub async fn cleanup_older_than(pool: &PgPool, days: i32) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM alarms WHERE created_at < NOW() - make_interval(days => $1)")
                .bind(days)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}

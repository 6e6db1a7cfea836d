//! Repository for the singleton `retention_policy` row.

use sqlx::PgPool;

use crate::models::retention::{RetentionPolicy, UpdateRetentionPolicy};

const COLUMNS: &str =
    "id, alarm_retention_days, breach_retention_days, keep_unacknowledged, updated_at";

/// Provides access to the retention policy. The row is seeded by migration.
pub struct RetentionRepo;

impl RetentionRepo {
    pub async fn get(pool: &PgPool) -> Result<RetentionPolicy, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM retention_policy WHERE id = 1");
        sqlx::query_as::<_, RetentionPolicy>(&query).fetch_one(pool).await
    }

    /// Update the policy. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        input: &UpdateRetentionPolicy,
    ) -> Result<RetentionPolicy, sqlx::Error> {
        let query = format!(
            "UPDATE retention_policy SET
                alarm_retention_days = COALESCE($1, alarm_retention_days),
                breach_retention_days = COALESCE($2, breach_retention_days),
                keep_unacknowledged = COALESCE($3, keep_unacknowledged)
             WHERE id = 1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RetentionPolicy>(&query)
            .bind(input.alarm_retention_days)
            .bind(input.breach_retention_days)
            .bind(input.keep_unacknowledged)
            .fetch_one(pool)
            .await
    }
}

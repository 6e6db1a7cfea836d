//! Repository for the `notification_recipients` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::notification::{CreateRecipient, NotificationRecipient, UpdateRecipient};

const COLUMNS: &str = "id, email, name, min_level, enabled, created_at, updated_at";

/// Provides CRUD operations for breach notification recipients.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Subscribe a recipient, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRecipient,
    ) -> Result<NotificationRecipient, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_recipients (email, name, min_level)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationRecipient>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.min_level)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<NotificationRecipient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_recipients ORDER BY email");
        sqlx::query_as::<_, NotificationRecipient>(&query).fetch_all(pool).await
    }

    /// Enabled recipients whose minimum level matches a breach of `level`.
    /// A `Critical` breach reaches everyone; a `Warning` breach skips
    /// recipients who opted into `Critical` only.
    pub async fn list_enabled_for_level(
        pool: &PgPool,
        level: &str,
    ) -> Result<Vec<NotificationRecipient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_recipients
             WHERE enabled = true
               AND (min_level = 'Warning' OR min_level = $1)
             ORDER BY email"
        );
        sqlx::query_as::<_, NotificationRecipient>(&query)
            .bind(level)
            .fetch_all(pool)
            .await
    }

    /// Update a recipient. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRecipient,
    ) -> Result<Option<NotificationRecipient>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_recipients SET
                email = COALESCE($2, email),
                name = COALESCE($3, name),
                min_level = COALESCE($4, min_level),
                enabled = COALESCE($5, enabled)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NotificationRecipient>(&query)
            .bind(id)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.min_level)
            .bind(input.enabled)
            .fetch_optional(pool)
            .await
    }

    /// Unsubscribe a recipient. Returns `true` if the row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notification_recipients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

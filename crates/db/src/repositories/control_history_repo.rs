//! Repository for the append-only `control_state_history` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::control::ControlHistoryEntry;

const COLUMNS: &str =
    "id, control_state_id, change_type, old_value, new_value, changed_by, reason, created_at";

/// Append and read the control audit trail. Rows are never updated.
pub struct ControlHistoryRepo;

impl ControlHistoryRepo {
    /// Append one history row.
    pub async fn append(
        pool: &PgPool,
        control_state_id: DbId,
        change_type: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        changed_by: Option<DbId>,
        reason: Option<&str>,
    ) -> Result<ControlHistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO control_state_history
                 (control_state_id, change_type, old_value, new_value, changed_by, reason)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControlHistoryEntry>(&query)
            .bind(control_state_id)
            .bind(change_type)
            .bind(old_value)
            .bind(new_value)
            .bind(changed_by)
            .bind(reason)
            .fetch_one(pool)
            .await
    }

    /// The most recent history for a control, newest first, capped at 50.
    pub async fn recent_for_control(
        pool: &PgPool,
        control_state_id: DbId,
    ) -> Result<Vec<ControlHistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM control_state_history
             WHERE control_state_id = $1
             ORDER BY created_at DESC
             LIMIT 50"
        );
        sqlx::query_as::<_, ControlHistoryEntry>(&query)
            .bind(control_state_id)
            .fetch_all(pool)
            .await
    }
}

//! Repository for the `control_permissions` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::control::{ControlPermission, CreateControlPermission};

const COLUMNS: &str =
    "id, user_id, control_state_id, permission_level, expires_at, granted_by, created_at";

/// Provides access to per-user control permission grants.
pub struct ControlPermissionRepo;

impl ControlPermissionRepo {
    /// Grant a permission, replacing any existing grant for the same
    /// user/control pair.
    pub async fn grant(
        pool: &PgPool,
        input: &CreateControlPermission,
        granted_by: DbId,
    ) -> Result<ControlPermission, sqlx::Error> {
        let query = format!(
            "INSERT INTO control_permissions
                 (user_id, control_state_id, permission_level, expires_at, granted_by)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_control_permissions_user_control
             DO UPDATE SET
                 permission_level = EXCLUDED.permission_level,
                 expires_at = EXCLUDED.expires_at,
                 granted_by = EXCLUDED.granted_by
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControlPermission>(&query)
            .bind(input.user_id)
            .bind(input.control_state_id)
            .bind(&input.permission_level)
            .bind(input.expires_at)
            .bind(granted_by)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<ControlPermission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM control_permissions ORDER BY created_at DESC");
        sqlx::query_as::<_, ControlPermission>(&query).fetch_all(pool).await
    }

    /// The strongest unexpired grant applying to a user and control. A
    /// NULL `control_state_id` grant applies to every control.
    pub async fn effective_level(
        pool: &PgPool,
        user_id: DbId,
        control_state_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT permission_level FROM control_permissions
             WHERE user_id = $1
               AND (control_state_id = $2 OR control_state_id IS NULL)
               AND (expires_at IS NULL OR expires_at > NOW())
             ORDER BY CASE permission_level
                 WHEN 'execute' THEN 3 WHEN 'request' THEN 2 ELSE 1 END DESC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(control_state_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(level,)| level))
    }

    /// Revoke a grant. Returns `true` if the row was deleted.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM control_permissions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

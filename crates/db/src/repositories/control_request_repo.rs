//! Repository for the `control_state_requests` table.

use sqlx::PgPool;
use uuid::Uuid;

use broms_core::types::DbId;

use crate::models::control::ControlRequest;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, control_state_id, requested_by, requested_value, reason, status, \
                        confirmation_token, expires_at, confirmed_by, resolved_at, created_at";

/// Provides access to control change requests.
pub struct ControlRequestRepo;

impl ControlRequestRepo {
    /// Create a pending request. The partial unique index on pending rows
    /// turns a simultaneous second request into a constraint violation.
    pub async fn create_pending(
        pool: &PgPool,
        control_state_id: DbId,
        requested_by: DbId,
        requested_value: &str,
        reason: Option<&str>,
        confirmation_token: Uuid,
        timeout_seconds: i32,
    ) -> Result<ControlRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO control_state_requests
                 (control_state_id, requested_by, requested_value, reason,
                  confirmation_token, expires_at)
             VALUES ($1, $2, $3, $4, $5, NOW() + make_interval(secs => $6))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControlRequest>(&query)
            .bind(control_state_id)
            .bind(requested_by)
            .bind(requested_value)
            .bind(reason)
            .bind(confirmation_token)
            .bind(f64::from(timeout_seconds))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ControlRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM control_state_requests WHERE id = $1");
        sqlx::query_as::<_, ControlRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token(
        pool: &PgPool,
        token: Uuid,
    ) -> Result<Option<ControlRequest>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM control_state_requests WHERE confirmation_token = $1");
        sqlx::query_as::<_, ControlRequest>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// The pending request for a control, if one exists.
    pub async fn find_pending_for_control(
        pool: &PgPool,
        control_state_id: DbId,
    ) -> Result<Option<ControlRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM control_state_requests
             WHERE control_state_id = $1 AND status = 'pending'"
        );
        sqlx::query_as::<_, ControlRequest>(&query)
            .bind(control_state_id)
            .fetch_optional(pool)
            .await
    }

    /// List requests, newest first. `requested_by = None` lists all (admin).
    pub async fn list(
        pool: &PgPool,
        requested_by: Option<DbId>,
    ) -> Result<Vec<ControlRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM control_state_requests
             WHERE ($1::bigint IS NULL OR requested_by = $1)
             ORDER BY created_at DESC
             LIMIT 200"
        );
        sqlx::query_as::<_, ControlRequest>(&query)
            .bind(requested_by)
            .fetch_all(pool)
            .await
    }

    /// Move a pending request to a terminal status. The status guard in the
    /// WHERE clause makes resolution race-safe: only one caller wins.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        new_status: &str,
        resolved_by: Option<DbId>,
    ) -> Result<Option<ControlRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE control_state_requests SET
                status = $2,
                confirmed_by = $3,
                resolved_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControlRequest>(&query)
            .bind(id)
            .bind(new_status)
            .bind(resolved_by)
            .fetch_optional(pool)
            .await
    }

    /// Expire all overdue pending requests, returning the rows that were
    /// flipped so history can be recorded for each.
    pub async fn expire_overdue(pool: &PgPool) -> Result<Vec<ControlRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE control_state_requests SET
                status = 'expired',
                resolved_at = NOW()
             WHERE status = 'pending' AND expires_at <= NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControlRequest>(&query).fetch_all(pool).await
    }
}

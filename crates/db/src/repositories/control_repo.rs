//! Repository for the `control_states` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::control::{ControlState, CreateControlState, UpdateControlState};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, station_id, node_id, name, description, control_type, \
                        current_value, is_synced_with_plc, requires_confirmation, danger_level, \
                        rate_limit_seconds, confirmation_timeout_seconds, min_value, max_value, \
                        allowed_values, last_changed_at, is_active, created_at, updated_at";

/// Provides CRUD operations for control states.
pub struct ControlRepo;

impl ControlRepo {
    /// Insert a new control state, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateControlState,
    ) -> Result<ControlState, sqlx::Error> {
        let query = format!(
            "INSERT INTO control_states (station_id, node_id, name, description, control_type,
                 requires_confirmation, danger_level, rate_limit_seconds,
                 confirmation_timeout_seconds, min_value, max_value, allowed_values)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControlState>(&query)
            .bind(input.station_id)
            .bind(input.node_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.control_type)
            .bind(input.requires_confirmation)
            .bind(input.danger_level)
            .bind(input.rate_limit_seconds)
            .bind(input.confirmation_timeout_seconds)
            .bind(input.min_value)
            .bind(input.max_value)
            .bind(&input.allowed_values)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ControlState>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM control_states WHERE id = $1");
        sqlx::query_as::<_, ControlState>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The control state attached to a node, if any.
    pub async fn find_by_node_id(
        pool: &PgPool,
        node_id: DbId,
    ) -> Result<Option<ControlState>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM control_states WHERE node_id = $1");
        sqlx::query_as::<_, ControlState>(&query)
            .bind(node_id)
            .fetch_optional(pool)
            .await
    }

    /// List control states, optionally filtered by station and a
    /// case-insensitive name search. `%` and `_` in the search term match
    /// literally.
    pub async fn list(
        pool: &PgPool,
        station: Option<DbId>,
        search: Option<&str>,
    ) -> Result<Vec<ControlState>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM control_states
             WHERE ($1::bigint IS NULL OR station_id = $1)
               AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
             ORDER BY station_id, name"
        );
        sqlx::query_as::<_, ControlState>(&query)
            .bind(station)
            .bind(search.map(super::escape_like))
            .fetch_all(pool)
            .await
    }

    /// Update a control state's configuration. Only non-`None` fields apply.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateControlState,
    ) -> Result<Option<ControlState>, sqlx::Error> {
        let query = format!(
            "UPDATE control_states SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                requires_confirmation = COALESCE($4, requires_confirmation),
                danger_level = COALESCE($5, danger_level),
                rate_limit_seconds = COALESCE($6, rate_limit_seconds),
                confirmation_timeout_seconds = COALESCE($7, confirmation_timeout_seconds),
                min_value = COALESCE($8, min_value),
                max_value = COALESCE($9, max_value),
                allowed_values = COALESCE($10, allowed_values),
                is_active = COALESCE($11, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ControlState>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.requires_confirmation)
            .bind(input.danger_level)
            .bind(input.rate_limit_seconds)
            .bind(input.confirmation_timeout_seconds)
            .bind(input.min_value)
            .bind(input.max_value)
            .bind(&input.allowed_values)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Record a successful write: new authoritative value, synced flag set,
    /// rate-limit clock restarted.
    pub async fn record_executed_value(
        pool: &PgPool,
        id: DbId,
        value: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE control_states SET
                current_value = $2,
                is_synced_with_plc = true,
                last_changed_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark the control out of sync after a failed write or observed drift.
    pub async fn mark_out_of_sync(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE control_states SET is_synced_with_plc = false WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Overwrite the current value from a PLC read without restarting the
    /// rate-limit clock (the change did not originate here).
    pub async fn record_synced_value(
        pool: &PgPool,
        id: DbId,
        value: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE control_states SET current_value = $2, is_synced_with_plc = true WHERE id = $1",
        )
        .bind(id)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM control_states WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for the `nodes` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::node::{CreateNode, Node, NodeFilter, UpdateNode, UpdateThresholds};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, station_id, tag_id, node_address, display_name, node_type, \
                        access_level, log_on_whole_change, last_logged_whole, last_value, \
                        last_read_at, warning_level, critical_level, min_value, max_value, \
                        thresholds_active, alarms_enabled, is_active, created_at, updated_at";

/// Provides CRUD operations for nodes.
pub struct NodeRepo;

impl NodeRepo {
    /// Insert a new node, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateNode) -> Result<Node, sqlx::Error> {
        let query = format!(
            "INSERT INTO nodes (station_id, tag_id, node_address, display_name,
                 node_type, access_level, log_on_whole_change)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(input.station_id)
            .bind(input.tag_id)
            .bind(&input.node_address)
            .bind(&input.display_name)
            .bind(&input.node_type)
            .bind(&input.access_level)
            .bind(input.log_on_whole_change)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Node>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM nodes WHERE id = $1");
        sqlx::query_as::<_, Node>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List nodes with the optional filters applied. The search term is a
    /// case-insensitive substring match over display name and node address;
    /// `%` and `_` in the term match literally.
    pub async fn list(pool: &PgPool, filter: &NodeFilter) -> Result<Vec<Node>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nodes
             WHERE ($1::bigint IS NULL OR station_id = $1)
               AND ($2::boolean IS NULL OR alarms_enabled = $2)
               AND ($3::boolean IS NULL OR is_active = $3)
               AND ($4::text IS NULL OR display_name ILIKE '%' || $4 || '%'
                    OR node_address ILIKE '%' || $4 || '%')
             ORDER BY station_id, display_name"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(filter.station)
            .bind(filter.alarms_enabled)
            .bind(filter.active)
            .bind(filter.search.as_deref().map(super::escape_like))
            .fetch_all(pool)
            .await
    }

    /// Active nodes for a station, for the sampling loop.
    pub async fn list_active_for_station(
        pool: &PgPool,
        station_id: DbId,
    ) -> Result<Vec<Node>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nodes
             WHERE station_id = $1 AND is_active = true
             ORDER BY id"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(station_id)
            .fetch_all(pool)
            .await
    }

    /// Update a node. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateNode,
    ) -> Result<Option<Node>, sqlx::Error> {
        let query = format!(
            "UPDATE nodes SET
                tag_id = COALESCE($2, tag_id),
                display_name = COALESCE($3, display_name),
                access_level = COALESCE($4, access_level),
                log_on_whole_change = COALESCE($5, log_on_whole_change),
                alarms_enabled = COALESCE($6, alarms_enabled),
                is_active = COALESCE($7, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(id)
            .bind(input.tag_id)
            .bind(&input.display_name)
            .bind(&input.access_level)
            .bind(input.log_on_whole_change)
            .bind(input.alarms_enabled)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Update a node's threshold settings.
    pub async fn update_thresholds(
        pool: &PgPool,
        id: DbId,
        input: &UpdateThresholds,
    ) -> Result<Option<Node>, sqlx::Error> {
        let query = format!(
            "UPDATE nodes SET
                warning_level = COALESCE($2, warning_level),
                critical_level = COALESCE($3, critical_level),
                min_value = COALESCE($4, min_value),
                max_value = COALESCE($5, max_value),
                thresholds_active = COALESCE($6, thresholds_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(id)
            .bind(input.warning_level)
            .bind(input.critical_level)
            .bind(input.min_value)
            .bind(input.max_value)
            .bind(input.thresholds_active)
            .fetch_optional(pool)
            .await
    }

    /// Record a fresh read on the node row. `logged_whole` is only set when
    /// the read was actually written to the telemetry log.
    pub async fn record_read(
        pool: &PgPool,
        id: DbId,
        value: &str,
        logged_whole: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE nodes SET
                last_value = $2,
                last_read_at = NOW(),
                last_logged_whole = COALESCE($3, last_logged_whole)
             WHERE id = $1",
        )
        .bind(id)
        .bind(value)
        .bind(logged_whole)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Delete a node and its dependent rows (FK cascade).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM nodes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for the `vpn_clients` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::vpn::{CreateVpnClient, UpdateVpnClient, VpnClient, VpnStatusSummary};

const COLUMNS: &str = "id, name, common_name, assigned_ip, is_connected, last_seen_at, \
                        bytes_received, bytes_sent, enabled, created_at, updated_at";

/// Provides CRUD operations for VPN client records.
pub struct VpnRepo;

impl VpnRepo {
    /// Provision a VPN client, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateVpnClient) -> Result<VpnClient, sqlx::Error> {
        let query = format!(
            "INSERT INTO vpn_clients (name, common_name, assigned_ip)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VpnClient>(&query)
            .bind(&input.name)
            .bind(&input.common_name)
            .bind(&input.assigned_ip)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VpnClient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vpn_clients WHERE id = $1");
        sqlx::query_as::<_, VpnClient>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<VpnClient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vpn_clients ORDER BY name");
        sqlx::query_as::<_, VpnClient>(&query).fetch_all(pool).await
    }

    /// Update a VPN client. Only non-`None` fields are applied. Connection
    /// state updates also stamp `last_seen_at`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVpnClient,
    ) -> Result<Option<VpnClient>, sqlx::Error> {
        let query = format!(
            "UPDATE vpn_clients SET
                name = COALESCE($2, name),
                common_name = COALESCE($3, common_name),
                assigned_ip = COALESCE($4, assigned_ip),
                is_connected = COALESCE($5, is_connected),
                last_seen_at = CASE WHEN $5 IS NOT NULL THEN NOW() ELSE last_seen_at END,
                bytes_received = COALESCE($6, bytes_received),
                bytes_sent = COALESCE($7, bytes_sent),
                enabled = COALESCE($8, enabled)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VpnClient>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.common_name)
            .bind(&input.assigned_ip)
            .bind(input.is_connected)
            .bind(input.bytes_received)
            .bind(input.bytes_sent)
            .bind(input.enabled)
            .fetch_optional(pool)
            .await
    }

    /// Fleet-wide connection and traffic totals.
    pub async fn status_summary(pool: &PgPool) -> Result<VpnStatusSummary, sqlx::Error> {
        sqlx::query_as::<_, VpnStatusSummary>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE is_connected) AS connected,
                    COALESCE(SUM(bytes_received), 0)::bigint AS bytes_received,
                    COALESCE(SUM(bytes_sent), 0)::bigint AS bytes_sent
             FROM vpn_clients",
        )
        .fetch_one(pool)
        .await
    }

    /// Delete a VPN client. Returns `true` if the row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vpn_clients WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

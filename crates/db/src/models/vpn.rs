//! VPN client models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::types::{DbId, Timestamp};

/// A VPN client row from the `vpn_clients` table. Stations reach the
/// service over a VPN; these records track the provisioned clients.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VpnClient {
    pub id: DbId,
    pub name: String,
    pub common_name: String,
    pub assigned_ip: Option<String>,
    pub is_connected: bool,
    pub last_seen_at: Option<Timestamp>,
    pub bytes_received: i64,
    pub bytes_sent: i64,
    pub enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for provisioning a VPN client.
#[derive(Debug, Deserialize)]
pub struct CreateVpnClient {
    pub name: String,
    #[serde(default)]
    pub common_name: String,
    pub assigned_ip: Option<String>,
}

/// DTO for updating a VPN client. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateVpnClient {
    pub name: Option<String>,
    pub common_name: Option<String>,
    pub assigned_ip: Option<String>,
    pub is_connected: Option<bool>,
    pub bytes_received: Option<i64>,
    pub bytes_sent: Option<i64>,
    pub enabled: Option<bool>,
}

/// Fleet-wide VPN status for the admin summary endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VpnStatusSummary {
    pub total: i64,
    pub connected: i64,
    pub bytes_received: i64,
    pub bytes_sent: i64,
}

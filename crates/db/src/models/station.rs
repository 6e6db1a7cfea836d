//! Station entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::station::StationTimeouts;
use broms_core::types::{DbId, Timestamp};

/// A station row from the `stations` table.
///
/// `auth_password` is the OPC UA endpoint credential, not a user password.
/// It is excluded from API output via [`StationResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct Station {
    pub id: DbId,
    pub name: String,
    pub endpoint_url: String,
    pub security_policy: String,
    pub security_mode: String,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub session_timeout_ms: i32,
    pub secure_channel_timeout_ms: i32,
    pub connection_timeout_ms: i32,
    pub request_timeout_ms: i32,
    pub acknowledge_timeout_ms: i32,
    pub subscription_interval_ms: i32,
    pub is_active: bool,
    pub connection_status: String,
    pub last_connected_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Station {
    pub fn timeouts(&self) -> StationTimeouts {
        StationTimeouts {
            session_ms: self.session_timeout_ms,
            secure_ms: self.secure_channel_timeout_ms,
            connection_ms: self.connection_timeout_ms,
            request_ms: self.request_timeout_ms,
            acknowledge_ms: self.acknowledge_timeout_ms,
            subscription_interval_ms: self.subscription_interval_ms,
        }
    }

    pub fn security_enabled(&self) -> bool {
        self.security_policy != "None"
    }
}

/// Station representation for API responses (no endpoint credentials).
#[derive(Debug, Clone, Serialize)]
pub struct StationResponse {
    pub id: DbId,
    pub name: String,
    pub endpoint_url: String,
    pub security_policy: String,
    pub security_mode: String,
    pub session_timeout_ms: i32,
    pub secure_channel_timeout_ms: i32,
    pub connection_timeout_ms: i32,
    pub request_timeout_ms: i32,
    pub acknowledge_timeout_ms: i32,
    pub subscription_interval_ms: i32,
    pub is_active: bool,
    pub connection_status: String,
    pub last_connected_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Station> for StationResponse {
    fn from(s: Station) -> Self {
        StationResponse {
            id: s.id,
            name: s.name,
            endpoint_url: s.endpoint_url,
            security_policy: s.security_policy,
            security_mode: s.security_mode,
            session_timeout_ms: s.session_timeout_ms,
            secure_channel_timeout_ms: s.secure_channel_timeout_ms,
            connection_timeout_ms: s.connection_timeout_ms,
            request_timeout_ms: s.request_timeout_ms,
            acknowledge_timeout_ms: s.acknowledge_timeout_ms,
            subscription_interval_ms: s.subscription_interval_ms,
            is_active: s.is_active,
            connection_status: s.connection_status,
            last_connected_at: s.last_connected_at,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// DTO for creating a station. Timeout fields fall back to the defaults
/// from the migration when omitted.
#[derive(Debug, Deserialize)]
pub struct CreateStation {
    pub name: String,
    pub endpoint_url: String,
    #[serde(default = "default_security")]
    pub security_policy: String,
    #[serde(default = "default_security")]
    pub security_mode: String,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub session_timeout_ms: Option<i32>,
    pub secure_channel_timeout_ms: Option<i32>,
    pub connection_timeout_ms: Option<i32>,
    pub request_timeout_ms: Option<i32>,
    pub acknowledge_timeout_ms: Option<i32>,
    pub subscription_interval_ms: Option<i32>,
}

fn default_security() -> String {
    "None".to_string()
}

/// DTO for updating a station. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateStation {
    pub name: Option<String>,
    pub endpoint_url: Option<String>,
    pub security_policy: Option<String>,
    pub security_mode: Option<String>,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    pub session_timeout_ms: Option<i32>,
    pub secure_channel_timeout_ms: Option<i32>,
    pub connection_timeout_ms: Option<i32>,
    pub request_timeout_ms: Option<i32>,
    pub acknowledge_timeout_ms: Option<i32>,
    pub subscription_interval_ms: Option<i32>,
    pub is_active: Option<bool>,
}

/// Fleet-level counts for the dashboard summary card.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StationSummary {
    pub total: i64,
    pub active: i64,
    pub connected: i64,
}

/// One online/offline transition from the connection log.
#[derive(Debug, Clone, FromRow)]
pub struct ConnectionLogEntry {
    pub id: DbId,
    pub station_id: DbId,
    pub online: bool,
    pub at: Timestamp,
}

//! OPC UA node config model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::threshold::ThresholdConfig;
use broms_core::types::{DbId, Timestamp};

/// A node row from the `nodes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Node {
    pub id: DbId,
    pub station_id: DbId,
    pub tag_id: Option<DbId>,
    pub node_address: String,
    pub display_name: String,
    /// `"reading"` or `"control"`. Control nodes are written through the
    /// control-state workflow, never via the plain write endpoint.
    pub node_type: String,
    /// `"read"` or `"write"`.
    pub access_level: String,
    pub log_on_whole_change: bool,
    pub last_logged_whole: Option<i64>,
    pub last_value: Option<String>,
    pub last_read_at: Option<Timestamp>,
    pub warning_level: Option<f64>,
    pub critical_level: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub thresholds_active: bool,
    pub alarms_enabled: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Node {
    pub fn threshold_config(&self) -> ThresholdConfig {
        ThresholdConfig {
            warning_level: self.warning_level,
            critical_level: self.critical_level,
            min_value: self.min_value,
            max_value: self.max_value,
            active: self.thresholds_active,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.access_level == "write"
    }
}

/// DTO for creating a node.
#[derive(Debug, Deserialize)]
pub struct CreateNode {
    pub station_id: DbId,
    pub tag_id: Option<DbId>,
    pub node_address: String,
    pub display_name: String,
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[serde(default = "default_access_level")]
    pub access_level: String,
    #[serde(default)]
    pub log_on_whole_change: bool,
}

fn default_node_type() -> String {
    "reading".to_string()
}

fn default_access_level() -> String {
    "read".to_string()
}

/// DTO for updating a node. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateNode {
    pub tag_id: Option<DbId>,
    pub display_name: Option<String>,
    pub access_level: Option<String>,
    pub log_on_whole_change: Option<bool>,
    pub alarms_enabled: Option<bool>,
    pub is_active: Option<bool>,
}

/// DTO for updating a node's threshold settings.
#[derive(Debug, Deserialize)]
pub struct UpdateThresholds {
    pub warning_level: Option<f64>,
    pub critical_level: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub thresholds_active: Option<bool>,
}

/// Query-side filters for node listing.
#[derive(Debug, Default, Deserialize)]
pub struct NodeFilter {
    pub station: Option<DbId>,
    pub alarms_enabled: Option<bool>,
    pub active: Option<bool>,
    /// Case-insensitive substring match over display name and address.
    pub search: Option<String>,
}

//! Control state models and DTOs: the supervised-write side of the system.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use broms_core::types::{DbId, Timestamp};

/// A control state row from the `control_states` table.
///
/// `current_value` is the server's last known value; `is_synced_with_plc`
/// goes false when a write fails or the poller observes drift.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ControlState {
    pub id: DbId,
    pub station_id: DbId,
    pub node_id: DbId,
    pub name: String,
    pub description: String,
    /// `"boolean"`, `"numeric"` or `"enum"`.
    pub control_type: String,
    pub current_value: String,
    pub is_synced_with_plc: bool,
    pub requires_confirmation: bool,
    pub danger_level: i16,
    pub rate_limit_seconds: i32,
    pub confirmation_timeout_seconds: i32,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Comma-separated list of allowed values for `enum` controls.
    pub allowed_values: Option<String>,
    pub last_changed_at: Option<Timestamp>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ControlState {
    /// Validate a requested value against the control's type constraints.
    pub fn validate_value(&self, value: &str) -> Result<(), String> {
        match self.control_type.as_str() {
            "boolean" => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("'{value}' is not a boolean value")),
            },
            "numeric" => {
                let v: f64 = value
                    .parse()
                    .map_err(|_| format!("'{value}' is not a numeric value"))?;
                if let Some(min) = self.min_value {
                    if v < min {
                        return Err(format!("{v} is below the minimum of {min}"));
                    }
                }
                if let Some(max) = self.max_value {
                    if v > max {
                        return Err(format!("{v} is above the maximum of {max}"));
                    }
                }
                Ok(())
            }
            "enum" => {
                let allowed = self.allowed_values.as_deref().unwrap_or("");
                if allowed.split(',').any(|a| a.trim() == value) {
                    Ok(())
                } else {
                    Err(format!("'{value}' is not one of the allowed values"))
                }
            }
            other => Err(format!("Unknown control type '{other}'")),
        }
    }
}

/// DTO for creating a control state.
#[derive(Debug, Deserialize)]
pub struct CreateControlState {
    pub station_id: DbId,
    pub node_id: DbId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_control_type")]
    pub control_type: String,
    #[serde(default = "default_true")]
    pub requires_confirmation: bool,
    #[serde(default)]
    pub danger_level: i16,
    #[serde(default)]
    pub rate_limit_seconds: i32,
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_seconds: i32,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub allowed_values: Option<String>,
}

fn default_control_type() -> String {
    "boolean".to_string()
}

fn default_true() -> bool {
    true
}

fn default_confirmation_timeout() -> i32 {
    300
}

/// DTO for updating a control state's configuration.
#[derive(Debug, Deserialize)]
pub struct UpdateControlState {
    pub name: Option<String>,
    pub description: Option<String>,
    pub requires_confirmation: Option<bool>,
    pub danger_level: Option<i16>,
    pub rate_limit_seconds: Option<i32>,
    pub confirmation_timeout_seconds: Option<i32>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub allowed_values: Option<String>,
    pub is_active: Option<bool>,
}

/// One immutable audit row from `control_state_history`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ControlHistoryEntry {
    pub id: DbId,
    pub control_state_id: DbId,
    pub change_type: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_by: Option<DbId>,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

/// A change request row from `control_state_requests`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ControlRequest {
    pub id: DbId,
    pub control_state_id: DbId,
    pub requested_by: DbId,
    pub requested_value: String,
    pub reason: Option<String>,
    pub status: String,
    #[serde(skip_serializing)]
    pub confirmation_token: Uuid,
    pub expires_at: Timestamp,
    pub confirmed_by: Option<DbId>,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A control permission grant.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ControlPermission {
    pub id: DbId,
    pub user_id: DbId,
    /// `None` grants the level across all controls.
    pub control_state_id: Option<DbId>,
    pub permission_level: String,
    pub expires_at: Option<Timestamp>,
    pub granted_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for granting a control permission.
#[derive(Debug, Deserialize)]
pub struct CreateControlPermission {
    pub user_id: DbId,
    pub control_state_id: Option<DbId>,
    pub permission_level: String,
    pub expires_at: Option<Timestamp>,
}

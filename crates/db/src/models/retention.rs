//! Retention policy model (singleton).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::types::Timestamp;

/// The single `retention_policy` row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RetentionPolicy {
    pub id: i64,
    pub alarm_retention_days: i32,
    pub breach_retention_days: i32,
    /// When true, unacknowledged breaches survive cleanup regardless of age.
    pub keep_unacknowledged: bool,
    pub updated_at: Timestamp,
}

/// DTO for updating the retention policy.
#[derive(Debug, Deserialize)]
pub struct UpdateRetentionPolicy {
    pub alarm_retention_days: Option<i32>,
    pub breach_retention_days: Option<i32>,
    pub keep_unacknowledged: Option<bool>,
}

//! Threshold breach model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::types::{DbId, Timestamp};

/// A breach row from the `breaches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Breach {
    pub id: DbId,
    pub node_id: DbId,
    pub station_id: DbId,
    /// `"Warning"` or `"Critical"`.
    pub level: String,
    pub value: String,
    pub threshold_value: Option<f64>,
    pub acknowledged: bool,
    pub acknowledged_by: Option<DbId>,
    pub acknowledged_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Query-side filters for breach listing.
#[derive(Debug, Default, Deserialize)]
pub struct BreachFilter {
    pub node: Option<DbId>,
    pub station: Option<DbId>,
    pub level: Option<String>,
    pub acknowledged: Option<bool>,
}

/// 24-hour totals per level for a node, for the threshold stats endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BreachStats {
    pub total: i64,
    pub warning: i64,
    pub critical: i64,
    pub unacknowledged: i64,
}

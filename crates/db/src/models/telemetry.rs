//! Telemetry log model.

use serde::Serialize;
use sqlx::FromRow;

use broms_core::types::{DbId, Timestamp};

/// One append-only read from the `telemetry_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TelemetryEntry {
    pub id: DbId,
    pub node_id: DbId,
    pub station_id: DbId,
    pub value: String,
    pub recorded_at: Timestamp,
}

//! Alarm model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::types::{DbId, Timestamp};

/// An alarm row from the `alarms` table. Alarms are coarser than breaches:
/// connection loss, failed writes and other operational events land here.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Alarm {
    pub id: DbId,
    pub station_id: Option<DbId>,
    pub node_id: Option<DbId>,
    pub severity: String,
    pub message: String,
    pub acknowledged: bool,
    pub acknowledged_by: Option<DbId>,
    pub acknowledged_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for raising an alarm.
pub struct CreateAlarm {
    pub station_id: Option<DbId>,
    pub node_id: Option<DbId>,
    pub severity: String,
    pub message: String,
}

/// Query-side filters for alarm listing.
#[derive(Debug, Default, Deserialize)]
pub struct AlarmFilter {
    pub station: Option<DbId>,
    pub severity: Option<String>,
    pub acknowledged: Option<bool>,
}

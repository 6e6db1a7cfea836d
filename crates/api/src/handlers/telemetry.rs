//! Telemetry export handler.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use broms_core::error::CoreError;
use broms_core::types::{DbId, Timestamp};
use broms_db::models::telemetry::TelemetryEntry;
use broms_db::repositories::TelemetryRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /telemetry`.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    pub station: DbId,
    /// Window start; defaults to 24 hours before `to`.
    pub from: Option<Timestamp>,
    /// Window end; defaults to now.
    pub to: Option<Timestamp>,
}

/// GET /api/v1/telemetry?station=&from=&to=
///
/// Time-ranged read log export, oldest first, capped server-side.
pub async fn list_telemetry(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<TelemetryQuery>,
) -> AppResult<Json<DataResponse<Vec<TelemetryEntry>>>> {
    let to = query.to.unwrap_or_else(Utc::now);
    let from = query.from.unwrap_or(to - chrono::Duration::hours(24));

    if from > to {
        return Err(AppError::Core(CoreError::Validation(
            "'from' must not be after 'to'".into(),
        )));
    }

    let entries = TelemetryRepo::range_for_station(&state.pool, query.station, from, to).await?;
    Ok(Json(DataResponse { data: entries }))
}

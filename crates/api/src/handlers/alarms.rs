//! Alarm handlers (operational events: connection loss, failed writes).

use axum::extract::{Path, Query, State};
use axum::Json;

use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::alarm::{Alarm, AlarmFilter};
use broms_db::repositories::AlarmRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireOperator};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/alarms?station=&severity=&acknowledged=
pub async fn list_alarms(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(filter): Query<AlarmFilter>,
) -> AppResult<Json<DataResponse<Vec<Alarm>>>> {
    let alarms = AlarmRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: alarms }))
}

/// POST /api/v1/alarms/{id}/acknowledge
pub async fn acknowledge_alarm(
    State(state): State<AppState>,
    RequireOperator(user): RequireOperator,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Alarm>>> {
    let alarm = AlarmRepo::acknowledge(&state.pool, id, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Alarm",
            id,
        }))?;
    Ok(Json(DataResponse { data: alarm }))
}

//! Threshold breach handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::breach::{Breach, BreachFilter};
use broms_db::repositories::BreachRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequireOperator};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /breaches/recent`.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// Lookback window in hours (default 24, capped at one week).
    pub hours: Option<i64>,
}

/// GET /api/v1/breaches?node=&station=&level=&acknowledged=
pub async fn list_breaches(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(filter): Query<BreachFilter>,
) -> AppResult<Json<DataResponse<Vec<Breach>>>> {
    if let Some(level) = &filter.level {
        if !matches!(level.as_str(), "Warning" | "Critical") {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown breach level '{level}'"
            ))));
        }
    }
    let breaches = BreachRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: breaches }))
}

/// GET /api/v1/breaches/unacknowledged
pub async fn list_unacknowledged(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<Breach>>>> {
    let breaches = BreachRepo::list_unacknowledged(&state.pool).await?;
    Ok(Json(DataResponse { data: breaches }))
}

/// GET /api/v1/breaches/recent?hours=
pub async fn list_recent(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<DataResponse<Vec<Breach>>>> {
    let hours = query.hours.unwrap_or(24).clamp(1, 168);
    let breaches = BreachRepo::list_recent(&state.pool, hours).await?;
    Ok(Json(DataResponse { data: breaches }))
}

/// POST /api/v1/breaches/{id}/acknowledge
pub async fn acknowledge_breach(
    State(state): State<AppState>,
    RequireOperator(user): RequireOperator,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Breach>>> {
    BreachRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Breach",
            id,
        }))?;

    let breach = BreachRepo::acknowledge(&state.pool, id, user.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict("Breach is already acknowledged".into()))
        })?;

    Ok(Json(DataResponse { data: breach }))
}

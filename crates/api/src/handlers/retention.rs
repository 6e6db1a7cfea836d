//! Retention policy handlers (singleton resource).

use axum::extract::State;
use axum::Json;

use broms_core::error::CoreError;
use broms_db::models::retention::{RetentionPolicy, UpdateRetentionPolicy};
use broms_db::repositories::RetentionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/retention-policy
pub async fn get_policy(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> AppResult<Json<DataResponse<RetentionPolicy>>> {
    let policy = RetentionRepo::get(&state.pool).await?;
    Ok(Json(DataResponse { data: policy }))
}

/// PUT /api/v1/retention-policy
pub async fn update_policy(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<UpdateRetentionPolicy>,
) -> AppResult<Json<DataResponse<RetentionPolicy>>> {
    for (field, days) in [
        ("alarm_retention_days", input.alarm_retention_days),
        ("breach_retention_days", input.breach_retention_days),
    ] {
        if let Some(days) = days {
            if days < 1 {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "{field} must be at least 1"
                ))));
            }
        }
    }

    let policy = RetentionRepo::update(&state.pool, &input).await?;
    Ok(Json(DataResponse { data: policy }))
}

//! Tag handlers (named measurements with engineering units).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::tag::{CreateTag, Tag};
use broms_db::repositories::TagRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth, RequireOperator};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tags
pub async fn list_tags(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<Tag>>>> {
    let tags = TagRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/tags
///
/// Idempotent on name: re-posting an existing tag returns the stored row.
pub async fn create_tag(
    State(state): State<AppState>,
    RequireOperator(_): RequireOperator,
    Json(input): Json<CreateTag>,
) -> AppResult<(StatusCode, Json<DataResponse<Tag>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Tag name must not be empty".into(),
        )));
    }
    let tag = TagRepo::create_or_get(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// DELETE /api/v1/tags/{id}
pub async fn delete_tag(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TagRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Tag", id }));
    }
    Ok(StatusCode::NO_CONTENT)
}

//! Breach notification recipient handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::notification::{CreateRecipient, NotificationRecipient, UpdateRecipient};
use broms_db::repositories::NotificationRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireOperator};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/notification-recipients
pub async fn list_recipients(
    State(state): State<AppState>,
    RequireOperator(_): RequireOperator,
) -> AppResult<Json<DataResponse<Vec<NotificationRecipient>>>> {
    let recipients = NotificationRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: recipients }))
}

/// POST /api/v1/notification-recipients
pub async fn create_recipient(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateRecipient>,
) -> AppResult<(StatusCode, Json<DataResponse<NotificationRecipient>>)> {
    validate_email(&input.email)?;
    validate_min_level(&input.min_level)?;

    let recipient = NotificationRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: recipient })))
}

/// PUT /api/v1/notification-recipients/{id}
pub async fn update_recipient(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRecipient>,
) -> AppResult<Json<DataResponse<NotificationRecipient>>> {
    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    if let Some(level) = &input.min_level {
        validate_min_level(level)?;
    }

    let recipient = NotificationRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "NotificationRecipient",
            id,
        }))?;
    Ok(Json(DataResponse { data: recipient }))
}

/// DELETE /api/v1/notification-recipients/{id}
pub async fn delete_recipient(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !NotificationRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "NotificationRecipient",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn validate_email(email: &str) -> AppResult<()> {
    if !validator::ValidateEmail::validate_email(&email) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "'{email}' is not a valid email address"
        ))));
    }
    Ok(())
}

fn validate_min_level(level: &str) -> AppResult<()> {
    if !matches!(level, "Warning" | "Critical") {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown breach level '{level}'"
        ))));
    }
    Ok(())
}

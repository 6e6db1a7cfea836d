//! Control state handlers: CRUD, the two-phase change workflow, history,
//! and permission grants.
//!
//! Changing a control follows request -> (confirm) -> execute. The server
//! clock decides rate limits and request expiry; `expires_in_seconds` and
//! `retry_after` in responses are display hints derived from it. Every
//! transition appends an immutable history row.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use broms_core::control::{
    rate_limit_remaining_now, request_expired, seconds_until_expiry, ChangeType, DangerLevel,
    PermissionLevel, RequestStatus,
};
use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::control::{
    ControlHistoryEntry, ControlPermission, ControlRequest, ControlState, CreateControlPermission,
    CreateControlState, UpdateControlState,
};
use broms_db::repositories::{
    ControlHistoryRepo, ControlPermissionRepo, ControlRepo, ControlRequestRepo, NodeRepo, UserRepo,
};
use broms_events::bus::{SystemEvent, EVENT_CONTROL_EXECUTED, EVENT_CONTROL_FAILED};

use crate::error::{AppError, AppResult};
use crate::handlers::nodes::map_write_error;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /control-states`.
#[derive(Debug, Deserialize)]
pub struct ControlListQuery {
    pub station: Option<DbId>,
    /// Case-insensitive substring match over the control name.
    pub search: Option<String>,
}

/// Request body for `POST /control-states/{id}/request-change`.
#[derive(Debug, Deserialize)]
pub struct ChangeRequest {
    pub requested_value: String,
    pub reason: Option<String>,
}

/// Request body for `POST /control-states/confirm-change`.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub confirmation_token: Uuid,
}

/// Danger level descriptor embedded in pending-change responses.
#[derive(Debug, Serialize)]
pub struct DangerInfo {
    pub level: i16,
    pub label: &'static str,
}

/// Outcome of a change request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeOutcome {
    /// The write went through immediately (no confirmation required, or
    /// the caller holds an `execute` grant).
    Executed { control: ControlState },
    /// A pending request awaits admin confirmation.
    PendingConfirmation {
        request_id: DbId,
        confirmation_token: Uuid,
        /// Display hint; the server clock is authoritative.
        expires_in_seconds: i64,
        danger_level: DangerInfo,
    },
}

// ---------------------------------------------------------------------------
// CRUD handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/control-states?station=&search=
pub async fn list_controls(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<ControlListQuery>,
) -> AppResult<Json<DataResponse<Vec<ControlState>>>> {
    let controls = ControlRepo::list(&state.pool, query.station, query.search.as_deref()).await?;
    Ok(Json(DataResponse { data: controls }))
}

/// POST /api/v1/control-states
pub async fn create_control(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateControlState>,
) -> AppResult<(StatusCode, Json<DataResponse<ControlState>>)> {
    validate_control_config(
        &input.control_type,
        input.danger_level,
        input.rate_limit_seconds,
        input.confirmation_timeout_seconds,
        input.allowed_values.as_deref(),
    )?;

    // The backing node must exist and be a control node.
    let node = NodeRepo::find_by_id(&state.pool, input.node_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Node",
            id: input.node_id,
        }))?;
    if node.node_type != "control" {
        return Err(AppError::Core(CoreError::Validation(
            "Backing node must have node_type 'control'".into(),
        )));
    }

    let control = ControlRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: control })))
}

/// GET /api/v1/control-states/{id}
pub async fn get_control(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ControlState>>> {
    let control = find_control(&state, id).await?;
    Ok(Json(DataResponse { data: control }))
}

/// PUT /api/v1/control-states/{id}
pub async fn update_control(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateControlState>,
) -> AppResult<Json<DataResponse<ControlState>>> {
    if let Some(level) = input.danger_level {
        if !(0..=3).contains(&level) {
            return Err(AppError::Core(CoreError::Validation(
                "danger_level must be between 0 and 3".into(),
            )));
        }
    }

    let control = ControlRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ControlState",
            id,
        }))?;
    Ok(Json(DataResponse { data: control }))
}

/// DELETE /api/v1/control-states/{id}
pub async fn delete_control(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ControlRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ControlState",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Change workflow
// ---------------------------------------------------------------------------

/// POST /api/v1/control-states/{id}/request-change
pub async fn request_change(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ChangeOutcome>>)> {
    let control = find_control(&state, id).await?;

    if !control.is_active {
        return Err(AppError::Core(CoreError::Conflict(
            "Control is inactive".into(),
        )));
    }

    // Permission gate. Admins act with execute-level authority; everyone
    // else needs an explicit unexpired grant that allows changes.
    let level = effective_permission(&state, &user, control.id).await?;
    if !level.allows_change() {
        return Err(AppError::Core(CoreError::Forbidden(
            "No permission to change this control".into(),
        )));
    }

    control
        .validate_value(&input.requested_value)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    if control.current_value == input.requested_value && control.is_synced_with_plc {
        return Err(AppError::Core(CoreError::Conflict(
            "Control already has the requested value".into(),
        )));
    }

    // Rate limit from the server clock.
    if let Some(last_changed_at) = control.last_changed_at {
        let remaining = rate_limit_remaining_now(last_changed_at, control.rate_limit_seconds);
        if remaining > 0.0 {
            return Err(AppError::Core(CoreError::RateLimited {
                retry_after_secs: remaining,
            }));
        }
    }

    // One pending request per control. The partial unique index backs
    // this check up against races.
    if ControlRequestRepo::find_pending_for_control(&state.pool, control.id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "A change request is already pending for this control".into(),
        )));
    }

    ControlHistoryRepo::append(
        &state.pool,
        control.id,
        ChangeType::Requested.as_str(),
        Some(control.current_value.as_str()),
        Some(input.requested_value.as_str()),
        Some(user.user_id),
        input.reason.as_deref(),
    )
    .await?;

    // Execute immediately when no confirmation is needed or the caller
    // holds execute-level authority.
    if !control.requires_confirmation || level == PermissionLevel::Execute {
        let updated = execute_write(
            &state,
            &control,
            &input.requested_value,
            user.user_id,
            input.reason.as_deref(),
        )
        .await?;
        return Ok((
            StatusCode::OK,
            Json(DataResponse {
                data: ChangeOutcome::Executed { control: updated },
            }),
        ));
    }

    let token = Uuid::new_v4();
    let request = ControlRequestRepo::create_pending(
        &state.pool,
        control.id,
        user.user_id,
        &input.requested_value,
        input.reason.as_deref(),
        token,
        control.confirmation_timeout_seconds,
    )
    .await?;

    tracing::info!(
        control_id = control.id,
        request_id = request.id,
        user_id = user.user_id,
        "Control change request pending confirmation"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: ChangeOutcome::PendingConfirmation {
                request_id: request.id,
                confirmation_token: token,
                expires_in_seconds: seconds_until_expiry(request.expires_at, Utc::now()),
                danger_level: danger_info(control.danger_level),
            },
        }),
    ))
}

/// POST /api/v1/control-states/confirm-change
///
/// Admin only. Resolves the pending request, executes the PLC write, and
/// records the outcome in history.
pub async fn confirm_change(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<ConfirmRequest>,
) -> AppResult<Json<DataResponse<ControlState>>> {
    let request = ControlRequestRepo::find_by_token(&state.pool, input.confirmation_token)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation("Unknown confirmation token".into()))
        })?;

    if RequestStatus::parse(&request.status) != Some(RequestStatus::Pending) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Request is already {}",
            request.status
        ))));
    }

    // The sweeper may not have run yet; check the clock directly.
    if request_expired(request.expires_at, Utc::now()) {
        expire_request(&state, &request).await?;
        return Err(AppError::Core(CoreError::Conflict(
            "Confirmation window has elapsed".into(),
        )));
    }

    let control = find_control(&state, request.control_state_id).await?;

    // Race-safe: only the first confirmer flips the pending row.
    let resolved = ControlRequestRepo::resolve(
        &state.pool,
        request.id,
        RequestStatus::Confirmed.as_str(),
        Some(admin.user_id),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Request was resolved by another session".into(),
        ))
    })?;

    ControlHistoryRepo::append(
        &state.pool,
        control.id,
        ChangeType::Confirmed.as_str(),
        Some(control.current_value.as_str()),
        Some(resolved.requested_value.as_str()),
        Some(admin.user_id),
        None,
    )
    .await?;

    let updated = execute_write(
        &state,
        &control,
        &resolved.requested_value,
        resolved.requested_by,
        resolved.reason.as_deref(),
    )
    .await?;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/control-states/requests/{id}/cancel
///
/// The requester or an admin may cancel a pending request.
pub async fn cancel_request(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ControlRequest>>> {
    let request = ControlRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ControlRequest",
            id,
        }))?;

    if request.requested_by != user.user_id && !user.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the requester or an admin may cancel a request".into(),
        )));
    }

    if RequestStatus::parse(&request.status) != Some(RequestStatus::Pending) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Request is already {}",
            request.status
        ))));
    }

    let cancelled = ControlRequestRepo::resolve(
        &state.pool,
        request.id,
        RequestStatus::Cancelled.as_str(),
        Some(user.user_id),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Request was resolved by another session".into(),
        ))
    })?;

    ControlHistoryRepo::append(
        &state.pool,
        cancelled.control_state_id,
        ChangeType::Cancelled.as_str(),
        None,
        Some(cancelled.requested_value.as_str()),
        Some(user.user_id),
        None,
    )
    .await?;

    Ok(Json(DataResponse { data: cancelled }))
}

/// GET /api/v1/control-states/{id}/history
pub async fn control_history(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ControlHistoryEntry>>>> {
    find_control(&state, id).await?;
    let history = ControlHistoryRepo::recent_for_control(&state.pool, id).await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/control-requests
///
/// Own requests; admins see everyone's.
pub async fn list_requests(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<ControlRequest>>>> {
    let requested_by = if user.is_admin() {
        None
    } else {
        Some(user.user_id)
    };
    let requests = ControlRequestRepo::list(&state.pool, requested_by).await?;
    Ok(Json(DataResponse { data: requests }))
}

// ---------------------------------------------------------------------------
// Permission grants
// ---------------------------------------------------------------------------

/// GET /api/v1/control-permissions
pub async fn list_permissions(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<ControlPermission>>>> {
    let grants = ControlPermissionRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: grants }))
}

/// POST /api/v1/control-permissions
pub async fn grant_permission(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateControlPermission>,
) -> AppResult<(StatusCode, Json<DataResponse<ControlPermission>>)> {
    if PermissionLevel::parse(&input.permission_level).is_none() {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown permission level '{}'",
            input.permission_level
        ))));
    }

    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }))?;

    if let Some(control_id) = input.control_state_id {
        find_control(&state, control_id).await?;
    }

    let grant = ControlPermissionRepo::grant(&state.pool, &input, admin.user_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: grant })))
}

/// DELETE /api/v1/control-permissions/{id}
pub async fn revoke_permission(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ControlPermissionRepo::revoke(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ControlPermission",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_control(state: &AppState, id: DbId) -> AppResult<ControlState> {
    ControlRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ControlState",
            id,
        }))
}

/// Resolve the caller's effective permission for a control.
async fn effective_permission(
    state: &AppState,
    user: &AuthUser,
    control_id: DbId,
) -> AppResult<PermissionLevel> {
    if user.is_admin() {
        return Ok(PermissionLevel::Execute);
    }

    let level = ControlPermissionRepo::effective_level(&state.pool, user.user_id, control_id)
        .await?
        .and_then(|s| PermissionLevel::parse(&s))
        .unwrap_or(PermissionLevel::View);
    Ok(level)
}

fn danger_info(raw: i16) -> DangerInfo {
    let level = DangerLevel::from_raw(raw);
    DangerInfo {
        level: level.0,
        label: level.label(),
    }
}

/// Execute the PLC write for a control and record the outcome.
///
/// On success the control's `current_value` becomes the requested value,
/// `is_synced_with_plc` is set, and the rate-limit clock restarts. On
/// failure the stored value is left untouched, a `failed` history row is
/// appended, and a 503 bubbles up with the link error.
async fn execute_write(
    state: &AppState,
    control: &ControlState,
    requested_value: &str,
    actor: DbId,
    reason: Option<&str>,
) -> AppResult<ControlState> {
    let node = NodeRepo::find_by_id(&state.pool, control.node_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Node",
            id: control.node_id,
        }))?;

    let write_result = state
        .station_manager
        .write_node(control.station_id, &node.node_address, requested_value)
        .await;

    if let Err(e) = write_result {
        // The PLC may or may not have applied the write; let the sampler
        // re-establish the truth on its next pass.
        ControlRepo::mark_out_of_sync(&state.pool, control.id).await?;

        let error_text = e.to_string();
        ControlHistoryRepo::append(
            &state.pool,
            control.id,
            ChangeType::Failed.as_str(),
            Some(control.current_value.as_str()),
            Some(requested_value),
            Some(actor),
            Some(&error_text),
        )
        .await?;

        state.event_bus.publish(
            SystemEvent::new(EVENT_CONTROL_FAILED)
                .with_source("control_state", control.id)
                .with_actor(actor)
                .with_payload(serde_json::json!({
                    "control": control.name,
                    "requested_value": requested_value,
                    "error": e.to_string(),
                })),
        );

        tracing::warn!(control_id = control.id, error = %e, "Control write failed");
        return Err(map_write_error(e));
    }

    ControlRepo::record_executed_value(&state.pool, control.id, requested_value).await?;
    ControlHistoryRepo::append(
        &state.pool,
        control.id,
        ChangeType::Executed.as_str(),
        Some(control.current_value.as_str()),
        Some(requested_value),
        Some(actor),
        reason,
    )
    .await?;

    state.event_bus.publish(
        SystemEvent::new(EVENT_CONTROL_EXECUTED)
            .with_source("control_state", control.id)
            .with_actor(actor)
            .with_payload(serde_json::json!({
                "control": control.name,
                "old_value": control.current_value,
                "new_value": requested_value,
            })),
    );

    tracing::info!(
        control_id = control.id,
        actor,
        old = %control.current_value,
        new = %requested_value,
        "Control write executed"
    );

    find_control(state, control.id).await
}

/// Flip a stale pending request to expired with a `timeout` history row.
async fn expire_request(state: &AppState, request: &ControlRequest) -> AppResult<()> {
    if ControlRequestRepo::resolve(
        &state.pool,
        request.id,
        RequestStatus::Expired.as_str(),
        None,
    )
    .await?
    .is_some()
    {
        ControlHistoryRepo::append(
            &state.pool,
            request.control_state_id,
            ChangeType::Timeout.as_str(),
            None,
            Some(request.requested_value.as_str()),
            None,
            Some("confirmation window elapsed"),
        )
        .await?;
    }
    Ok(())
}

fn validate_control_config(
    control_type: &str,
    danger_level: i16,
    rate_limit_seconds: i32,
    confirmation_timeout_seconds: i32,
    allowed_values: Option<&str>,
) -> AppResult<()> {
    if !matches!(control_type, "boolean" | "numeric" | "enum") {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown control type '{control_type}'"
        ))));
    }
    if !(0..=3).contains(&danger_level) {
        return Err(AppError::Core(CoreError::Validation(
            "danger_level must be between 0 and 3".into(),
        )));
    }
    if rate_limit_seconds < 0 {
        return Err(AppError::Core(CoreError::Validation(
            "rate_limit_seconds must not be negative".into(),
        )));
    }
    if confirmation_timeout_seconds <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "confirmation_timeout_seconds must be positive".into(),
        )));
    }
    if control_type == "enum" && allowed_values.map_or(true, |v| v.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation(
            "Enum controls require a non-empty allowed_values list".into(),
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn danger_info_clamps_and_labels() {
        let info = danger_info(2);
        assert_eq!(info.level, 2);
        assert!(info.label.starts_with("Danger"));

        // Out-of-range stored values are clamped rather than rejected.
        let info = danger_info(9);
        assert_eq!(info.level, 3);
    }

    #[test]
    fn enum_controls_require_allowed_values() {
        let err = validate_control_config("enum", 0, 0, 300, None);
        assert!(err.is_err());

        let ok = validate_control_config("enum", 0, 0, 300, Some("auto,manual"));
        assert!(ok.is_ok());
    }

    #[test]
    fn unknown_control_type_rejected() {
        assert!(validate_control_config("dial", 0, 0, 300, None).is_err());
        assert!(validate_control_config("boolean", 0, 0, 300, None).is_ok());
    }
}

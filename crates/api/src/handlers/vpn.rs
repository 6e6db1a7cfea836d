//! VPN client administration handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::vpn::{CreateVpnClient, UpdateVpnClient, VpnClient, VpnStatusSummary};
use broms_db::repositories::VpnRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/vpn-clients
pub async fn list_clients(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<VpnClient>>>> {
    let clients = VpnRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: clients }))
}

/// POST /api/v1/vpn-clients
pub async fn create_client(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateVpnClient>,
) -> AppResult<(StatusCode, Json<DataResponse<VpnClient>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Client name must not be empty".into(),
        )));
    }

    let client = VpnRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: client })))
}

/// GET /api/v1/vpn-clients/summary
pub async fn status_summary(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> AppResult<Json<DataResponse<VpnStatusSummary>>> {
    let summary = VpnRepo::status_summary(&state.pool).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/vpn-clients/{id}
pub async fn get_client(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VpnClient>>> {
    let client = VpnRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VpnClient",
            id,
        }))?;
    Ok(Json(DataResponse { data: client }))
}

/// PUT /api/v1/vpn-clients/{id}
pub async fn update_client(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateVpnClient>,
) -> AppResult<Json<DataResponse<VpnClient>>> {
    let client = VpnRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VpnClient",
            id,
        }))?;
    Ok(Json(DataResponse { data: client }))
}

/// DELETE /api/v1/vpn-clients/{id}
pub async fn delete_client(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !VpnRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "VpnClient",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

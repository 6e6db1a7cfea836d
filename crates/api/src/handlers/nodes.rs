//! Node handlers: CRUD, latest value, and direct writes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use broms_core::error::CoreError;
use broms_core::node_id::validate_node_id;
use broms_core::types::{DbId, Timestamp};
use broms_db::models::node::{CreateNode, Node, NodeFilter, UpdateNode};
use broms_db::repositories::{NodeRepo, TelemetryRepo};
use broms_poller::StationManagerError;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth, RequireOperator};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /nodes/{id}/write`.
#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub value: String,
}

/// Response payload for `GET /nodes/{id}/value`.
#[derive(Debug, Serialize)]
pub struct NodeValue {
    pub node_id: DbId,
    pub value: Option<String>,
    pub recorded_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/nodes?station=&alarms_enabled=&active=&search=
pub async fn list_nodes(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(filter): Query<NodeFilter>,
) -> AppResult<Json<DataResponse<Vec<Node>>>> {
    let nodes = NodeRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: nodes }))
}

/// POST /api/v1/nodes
pub async fn create_node(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateNode>,
) -> AppResult<(StatusCode, Json<DataResponse<Node>>)> {
    validate_node_id(&input.node_address).map_err(AppError::Core)?;
    if !matches!(input.node_type.as_str(), "reading" | "control") {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown node type '{}'",
            input.node_type
        ))));
    }
    if !matches!(input.access_level.as_str(), "read" | "write") {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown access level '{}'",
            input.access_level
        ))));
    }

    let node = NodeRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: node })))
}

/// GET /api/v1/nodes/{id}
pub async fn get_node(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Node>>> {
    let node = find_node(&state, id).await?;
    Ok(Json(DataResponse { data: node }))
}

/// PUT /api/v1/nodes/{id}
pub async fn update_node(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNode>,
) -> AppResult<Json<DataResponse<Node>>> {
    if let Some(level) = &input.access_level {
        if !matches!(level.as_str(), "read" | "write") {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown access level '{level}'"
            ))));
        }
    }

    let node = NodeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Node", id }))?;
    Ok(Json(DataResponse { data: node }))
}

/// DELETE /api/v1/nodes/{id}
pub async fn delete_node(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !NodeRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "Node", id }));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/nodes/{id}/value
///
/// The latest logged read, falling back to the node's last raw read when
/// whole-number sampling suppressed the log entry.
pub async fn node_value(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<NodeValue>>> {
    let node = find_node(&state, id).await?;

    let data = match TelemetryRepo::latest_for_node(&state.pool, id).await? {
        Some(entry) if node.last_read_at <= Some(entry.recorded_at) => NodeValue {
            node_id: id,
            value: Some(entry.value),
            recorded_at: Some(entry.recorded_at),
        },
        _ => NodeValue {
            node_id: id,
            value: node.last_value,
            recorded_at: node.last_read_at,
        },
    };

    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/nodes/{id}/write
///
/// Direct write to a writable reading node. Control nodes are rejected:
/// they change only through the control-state workflow.
pub async fn write_node(
    State(state): State<AppState>,
    RequireOperator(_): RequireOperator,
    Path(id): Path<DbId>,
    Json(input): Json<WriteRequest>,
) -> AppResult<Json<DataResponse<NodeValue>>> {
    let node = find_node(&state, id).await?;

    if node.node_type == "control" {
        return Err(AppError::Core(CoreError::Conflict(
            "Control nodes must be written through the control-state workflow".into(),
        )));
    }
    if !node.is_writable() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Node is not writable".into(),
        )));
    }

    state
        .station_manager
        .write_node(node.station_id, &node.node_address, &input.value)
        .await
        .map_err(map_write_error)?;

    NodeRepo::record_read(&state.pool, id, &input.value, None).await?;

    Ok(Json(DataResponse {
        data: NodeValue {
            node_id: id,
            value: Some(input.value),
            recorded_at: Some(chrono::Utc::now()),
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_node(state: &AppState, id: DbId) -> AppResult<Node> {
    NodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Node", id }))
}

/// Station link failures surface as 503 so clients can retry; anything
/// else is an internal error.
pub fn map_write_error(err: StationManagerError) -> AppError {
    match err {
        StationManagerError::StationNotManaged(_) => {
            AppError::Unavailable("Station is not connected".into())
        }
        StationManagerError::Link(e) => AppError::Unavailable(format!("Write failed: {e}")),
    }
}

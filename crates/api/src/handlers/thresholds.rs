//! Threshold settings and breach reporting per node.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::breach::{Breach, BreachStats};
use broms_db::models::node::{NodeFilter, UpdateThresholds};
use broms_db::repositories::{BreachRepo, NodeRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// A node's threshold settings, as listed by `GET /thresholds`.
#[derive(Debug, Serialize)]
pub struct ThresholdSettings {
    pub node_id: DbId,
    pub station_id: DbId,
    pub display_name: String,
    pub warning_level: Option<f64>,
    pub critical_level: Option<f64>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub thresholds_active: bool,
    pub alarms_enabled: bool,
}

/// GET /api/v1/thresholds?station=&search=
pub async fn list_thresholds(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(filter): Query<NodeFilter>,
) -> AppResult<Json<DataResponse<Vec<ThresholdSettings>>>> {
    let nodes = NodeRepo::list(&state.pool, &filter).await?;
    let data = nodes
        .into_iter()
        .map(|n| ThresholdSettings {
            node_id: n.id,
            station_id: n.station_id,
            display_name: n.display_name,
            warning_level: n.warning_level,
            critical_level: n.critical_level,
            min_value: n.min_value,
            max_value: n.max_value,
            thresholds_active: n.thresholds_active,
            alarms_enabled: n.alarms_enabled,
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/thresholds/{node_id}
pub async fn update_thresholds(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(node_id): Path<DbId>,
    Json(input): Json<UpdateThresholds>,
) -> AppResult<Json<DataResponse<ThresholdSettings>>> {
    // Warning at or above critical would make every warning a critical.
    if let (Some(warning), Some(critical)) = (input.warning_level, input.critical_level) {
        if warning >= critical {
            return Err(AppError::Core(CoreError::Validation(
                "warning_level must be below critical_level".into(),
            )));
        }
    }

    let node = NodeRepo::update_thresholds(&state.pool, node_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Node",
            id: node_id,
        }))?;

    Ok(Json(DataResponse {
        data: ThresholdSettings {
            node_id: node.id,
            station_id: node.station_id,
            display_name: node.display_name,
            warning_level: node.warning_level,
            critical_level: node.critical_level,
            min_value: node.min_value,
            max_value: node.max_value,
            thresholds_active: node.thresholds_active,
            alarms_enabled: node.alarms_enabled,
        },
    }))
}

/// GET /api/v1/thresholds/{node_id}/breaches
pub async fn node_breaches(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(node_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Breach>>>> {
    ensure_node_exists(&state, node_id).await?;
    let breaches = BreachRepo::list_for_node(&state.pool, node_id).await?;
    Ok(Json(DataResponse { data: breaches }))
}

/// GET /api/v1/thresholds/{node_id}/breaches/stats
pub async fn node_breach_stats(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(node_id): Path<DbId>,
) -> AppResult<Json<DataResponse<BreachStats>>> {
    ensure_node_exists(&state, node_id).await?;
    let stats = BreachRepo::stats_24h(&state.pool, node_id).await?;
    Ok(Json(DataResponse { data: stats }))
}

async fn ensure_node_exists(state: &AppState, id: DbId) -> AppResult<()> {
    NodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Node", id }))?;
    Ok(())
}

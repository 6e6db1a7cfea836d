//! Station handlers: CRUD, fleet summary, and uptime reporting.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use broms_core::error::CoreError;
use broms_core::station;
use broms_core::types::DbId;
use broms_core::uptime::{uptime_percent, Transition};
use broms_db::models::station::{CreateStation, StationResponse, StationSummary, UpdateStation};
use broms_db::repositories::StationRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /stations/uptime`.
#[derive(Debug, Deserialize)]
pub struct UptimeQuery {
    /// Window length in days (default 7, capped at 365).
    pub days: Option<i64>,
}

/// Per-station uptime figure.
#[derive(Debug, Serialize)]
pub struct StationUptime {
    pub station_id: DbId,
    pub name: String,
    pub uptime_percent: f64,
}

/// Response payload for `GET /stations/uptime`.
#[derive(Debug, Serialize)]
pub struct UptimeReport {
    pub window_days: i64,
    /// Mean of the per-station figures, 0 when there are no stations.
    pub overall_percent: f64,
    pub stations: Vec<StationUptime>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/stations
pub async fn list_stations(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> AppResult<Json<DataResponse<Vec<StationResponse>>>> {
    let stations = StationRepo::list(&state.pool).await?;
    Ok(Json(DataResponse {
        data: stations.into_iter().map(StationResponse::from).collect(),
    }))
}

/// POST /api/v1/stations
pub async fn create_station(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateStation>,
) -> AppResult<(StatusCode, Json<DataResponse<StationResponse>>)> {
    station::validate_endpoint_url(&input.endpoint_url).map_err(AppError::Core)?;
    station::validate_security(&input.security_policy, &input.security_mode)
        .map_err(AppError::Core)?;

    // Merge the request against the migration defaults so the timeout
    // ordering rules see the values that will actually be stored.
    let defaults = station::StationTimeouts::default();
    let merged = station::StationTimeouts {
        session_ms: input.session_timeout_ms.unwrap_or(defaults.session_ms),
        secure_ms: input.secure_channel_timeout_ms.unwrap_or(defaults.secure_ms),
        connection_ms: input.connection_timeout_ms.unwrap_or(defaults.connection_ms),
        request_ms: input.request_timeout_ms.unwrap_or(defaults.request_ms),
        acknowledge_ms: input
            .acknowledge_timeout_ms
            .unwrap_or(defaults.acknowledge_ms),
        subscription_interval_ms: input
            .subscription_interval_ms
            .unwrap_or(defaults.subscription_interval_ms),
    };
    station::validate_timeouts(&merged, input.security_policy != "None")
        .map_err(AppError::Core)?;

    let created = StationRepo::create(&state.pool, &input).await?;

    state.station_manager.restart_station(created.id).await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: created.into(),
        }),
    ))
}

/// GET /api/v1/stations/summary
pub async fn station_summary(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
) -> AppResult<Json<DataResponse<StationSummary>>> {
    let summary = StationRepo::summary(&state.pool).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/stations/uptime?days=
///
/// Uptime is derived from the connection log: the state at the start of
/// the window comes from the last transition before it, and each logged
/// transition inside the window toggles the online/offline accumulator.
pub async fn station_uptime(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<UptimeQuery>,
) -> AppResult<Json<DataResponse<UptimeReport>>> {
    let days = query.days.unwrap_or(7).clamp(1, 365);
    let window_end = Utc::now();
    let window_start = window_end - chrono::Duration::days(days);

    let stations = StationRepo::list(&state.pool).await?;
    let mut per_station = Vec::with_capacity(stations.len());

    for s in &stations {
        let initially_online = match StationRepo::last_transition_before(
            &state.pool,
            s.id,
            window_start,
        )
        .await?
        {
            Some(entry) => entry.online,
            // No history before the window: a station that has never
            // logged a transition is treated as offline until its first.
            None => false,
        };

        let transitions: Vec<Transition> =
            StationRepo::connection_log(&state.pool, s.id, window_start, window_end)
                .await?
                .into_iter()
                .map(|entry| Transition {
                    at: entry.at,
                    online: entry.online,
                })
                .collect();

        per_station.push(StationUptime {
            station_id: s.id,
            name: s.name.clone(),
            uptime_percent: uptime_percent(window_start, window_end, initially_online, &transitions),
        });
    }

    let overall_percent = if per_station.is_empty() {
        0.0
    } else {
        per_station.iter().map(|s| s.uptime_percent).sum::<f64>() / per_station.len() as f64
    };

    Ok(Json(DataResponse {
        data: UptimeReport {
            window_days: days,
            overall_percent,
            stations: per_station,
        },
    }))
}

/// GET /api/v1/stations/{id}
pub async fn get_station(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<StationResponse>>> {
    let station = StationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Station",
            id,
        }))?;
    Ok(Json(DataResponse {
        data: station.into(),
    }))
}

/// PUT /api/v1/stations/{id}
///
/// Restarts the polling task so new endpoint/timeout settings take effect.
pub async fn update_station(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStation>,
) -> AppResult<Json<DataResponse<StationResponse>>> {
    let existing = StationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Station",
            id,
        }))?;

    if let Some(url) = &input.endpoint_url {
        station::validate_endpoint_url(url).map_err(AppError::Core)?;
    }
    let policy = input
        .security_policy
        .as_deref()
        .unwrap_or(&existing.security_policy);
    let mode = input
        .security_mode
        .as_deref()
        .unwrap_or(&existing.security_mode);
    station::validate_security(policy, mode).map_err(AppError::Core)?;

    let current = existing.timeouts();
    let merged = station::StationTimeouts {
        session_ms: input.session_timeout_ms.unwrap_or(current.session_ms),
        secure_ms: input.secure_channel_timeout_ms.unwrap_or(current.secure_ms),
        connection_ms: input.connection_timeout_ms.unwrap_or(current.connection_ms),
        request_ms: input.request_timeout_ms.unwrap_or(current.request_ms),
        acknowledge_ms: input
            .acknowledge_timeout_ms
            .unwrap_or(current.acknowledge_ms),
        subscription_interval_ms: input
            .subscription_interval_ms
            .unwrap_or(current.subscription_interval_ms),
    };
    station::validate_timeouts(&merged, policy != "None").map_err(AppError::Core)?;

    let updated = StationRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Station",
            id,
        }))?;

    state.station_manager.restart_station(id).await;

    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}

/// DELETE /api/v1/stations/{id}
pub async fn delete_station(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.station_manager.stop_station(id).await;

    if !StationRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Station",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}


//! One sampling pass over a station's nodes.
//!
//! Each pass reads every active node, decides whether the read belongs in
//! the telemetry log (whole-number-change sampling), evaluates thresholds,
//! and reconciles control nodes whose PLC value drifted from the server's
//! last known value.

use sqlx::PgPool;

use broms_core::control::ChangeType;
use broms_core::sampling;
use broms_core::types::DbId;
use broms_db::models::node::Node;
use broms_db::repositories::{
    BreachRepo, ControlHistoryRepo, ControlRepo, NodeRepo, TelemetryRepo,
};
use broms_events::bus::{EventBus, SystemEvent, EVENT_BREACH_DETECTED};

use crate::link::{LinkError, StationLink};

/// Read all active nodes of a station once.
///
/// Returns an error only when the link itself fails, which the caller
/// treats as a lost connection. Per-node persistence errors are logged
/// and skipped so one bad node cannot stall the station.
pub async fn sample_station(
    pool: &PgPool,
    bus: &EventBus,
    station_id: DbId,
    link: &dyn StationLink,
) -> Result<(), LinkError> {
    let nodes = match NodeRepo::list_active_for_station(pool, station_id).await {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::error!(station_id, error = %e, "Failed to load nodes for sampling");
            return Ok(());
        }
    };

    for node in nodes {
        let value = match link.read(&node.node_address).await {
            Ok(value) => value,
            Err(LinkError::BadAddress(addr)) => {
                tracing::warn!(node_id = node.id, %addr, "Skipping node with rejected address");
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = record_sample(pool, bus, &node, &value).await {
            tracing::error!(node_id = node.id, error = %e, "Failed to persist sample");
        }
    }

    Ok(())
}

async fn record_sample(
    pool: &PgPool,
    bus: &EventBus,
    node: &Node,
    value: &str,
) -> Result<(), sqlx::Error> {
    let last_whole = if node.log_on_whole_change {
        node.last_logged_whole
    } else {
        None
    };
    let should_log = !node.log_on_whole_change || sampling::should_log(last_whole, value);

    let logged_whole = if should_log {
        TelemetryRepo::insert(pool, node.id, node.station_id, value).await?;
        sampling::whole_part(value)
    } else {
        None
    };
    NodeRepo::record_read(pool, node.id, value, logged_whole).await?;

    if node.alarms_enabled {
        if let Some(level) = node.threshold_config().evaluate_raw(value) {
            let threshold = match level {
                broms_core::threshold::BreachLevel::Critical => node.critical_level,
                broms_core::threshold::BreachLevel::Warning => node.warning_level,
            };
            let breach = BreachRepo::insert(
                pool,
                node.id,
                node.station_id,
                level.as_str(),
                value,
                threshold,
            )
            .await?;
            tracing::warn!(
                node_id = node.id,
                station_id = node.station_id,
                level = level.as_str(),
                value,
                "Threshold breach recorded"
            );
            bus.publish(
                SystemEvent::new(EVENT_BREACH_DETECTED)
                    .with_source("node", node.id)
                    .with_payload(serde_json::json!({
                        "breach_id": breach.id,
                        "station_id": node.station_id,
                        "node": node.display_name,
                        "level": level.as_str(),
                        "value": value,
                        "threshold": threshold,
                    })),
            );
        }
    }

    if node.node_type == "control" {
        sync_control_value(pool, node, value).await?;
    }

    Ok(())
}

/// Reconcile a control node whose PLC value no longer matches the server's
/// record. The change did not originate here, so it lands in history as a
/// `synced` entry with no actor.
async fn sync_control_value(pool: &PgPool, node: &Node, value: &str) -> Result<(), sqlx::Error> {
    let Some(control) = ControlRepo::find_by_node_id(pool, node.id).await? else {
        return Ok(());
    };

    if control.current_value == value && control.is_synced_with_plc {
        return Ok(());
    }

    ControlRepo::record_synced_value(pool, control.id, value).await?;
    ControlHistoryRepo::append(
        pool,
        control.id,
        ChangeType::Synced.as_str(),
        Some(control.current_value.as_str()),
        Some(value),
        None,
        None,
    )
    .await?;
    tracing::info!(
        control_id = control.id,
        old = %control.current_value,
        new = value,
        "Control value synced from PLC"
    );
    Ok(())
}

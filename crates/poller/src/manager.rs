//! Multi-station connection manager.
//!
//! [`StationManager`] orchestrates the per-station polling tasks. It loads
//! active stations from the database on startup, spawns a task per station
//! (connect -> sample -> reconnect loop), keeps `connection_status` and the
//! connection log current, and exposes [`write_node`](StationManager::write_node)
//! for control execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use broms_core::station::ConnectionStatus;
use broms_core::types::DbId;
use broms_db::models::alarm::CreateAlarm;
use broms_db::models::station::Station;
use broms_db::repositories::{AlarmRepo, StationRepo};
use broms_events::bus::{
    EventBus, SystemEvent, EVENT_STATION_CONNECTED, EVENT_STATION_DISCONNECTED,
};

use crate::link::{LinkError, SimulatedLink, StationLink};
use crate::reconnect::{reconnect_burst, reconnect_loop, ReconnectConfig, ReconnectOutcome};
use crate::sampler::sample_station;

/// Builds a link for a station. Swapped out in tests and by real transports.
pub type LinkFactory = dyn Fn(&Station) -> Arc<dyn StationLink> + Send + Sync;

/// Manages polling tasks for all active stations.
///
/// Created once at application startup via [`StationManager::start`].
/// The returned `Arc` can be cheaply cloned into request handlers.
pub struct StationManager {
    /// Active polling tasks indexed by station id.
    stations: RwLock<HashMap<DbId, ManagedStation>>,
    pool: PgPool,
    bus: Arc<EventBus>,
    link_factory: Box<LinkFactory>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
}

/// Internal bookkeeping for a single station.
struct ManagedStation {
    link: Arc<dyn StationLink>,
    task_handle: tokio::task::JoinHandle<()>,
    /// Per-station cancellation token (child of the master token).
    cancel: CancellationToken,
}

impl StationManager {
    /// Load active stations from the database and start polling each with
    /// the default simulated link.
    pub async fn start(pool: PgPool, bus: Arc<EventBus>) -> Arc<Self> {
        Self::start_with_factory(pool, bus, Box::new(|s| Arc::new(SimulatedLink::new(s.id)))).await
    }

    /// As [`start`](Self::start), with a custom link factory.
    pub async fn start_with_factory(
        pool: PgPool,
        bus: Arc<EventBus>,
        link_factory: Box<LinkFactory>,
    ) -> Arc<Self> {
        let manager = Arc::new(Self {
            stations: RwLock::new(HashMap::new()),
            pool,
            bus,
            link_factory,
            cancel: CancellationToken::new(),
        });

        manager.load_and_connect().await;
        manager
    }

    /// Return the IDs of all stations currently being polled.
    pub async fn managed_station_ids(&self) -> Vec<DbId> {
        self.stations.read().await.keys().copied().collect()
    }

    /// Write a value to a node on a station. Used by the control workflow;
    /// the caller is responsible for permission checks and history.
    pub async fn write_node(
        &self,
        station_id: DbId,
        node_address: &str,
        value: &str,
    ) -> Result<(), StationManagerError> {
        let stations = self.stations.read().await;
        let managed = stations
            .get(&station_id)
            .ok_or(StationManagerError::StationNotManaged(station_id))?;

        managed.link.write(node_address, value).await?;

        tracing::info!(station_id, node_address, value, "Node write executed");
        Ok(())
    }

    /// Stop polling a station and start it again with fresh config.
    /// Called after station updates so timeout changes take effect.
    pub async fn restart_station(&self, station_id: DbId) {
        self.stop_station(station_id).await;
        match StationRepo::find_by_id(&self.pool, station_id).await {
            Ok(Some(station)) if station.is_active => self.spawn_station(station).await,
            Ok(_) => {}
            Err(e) => {
                tracing::error!(station_id, error = %e, "Failed to reload station");
            }
        }
    }

    /// Stop polling a station (deactivation or deletion).
    pub async fn stop_station(&self, station_id: DbId) {
        if let Some(managed) = self.stations.write().await.remove(&station_id) {
            managed.cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(5), managed.task_handle).await;
            tracing::info!(station_id, "Polling task stopped");
        }
    }

    /// Gracefully shut down all polling tasks.
    ///
    /// Cancels the master token, then waits up to 5 seconds per task
    /// for a clean exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down station manager");
        self.cancel.cancel();

        let mut stations = self.stations.write().await;
        for (id, managed) in stations.drain() {
            tracing::info!(station_id = id, "Stopping polling task");
            managed.cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(5), managed.task_handle).await;
        }

        tracing::info!("Station manager shut down complete");
    }

    // ---- private helpers ----

    /// Query the database for active stations and spawn a polling task for
    /// each.
    async fn load_and_connect(&self) {
        let stations = match StationRepo::list_active(&self.pool).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load stations");
                return;
            }
        };

        tracing::info!(count = stations.len(), "Loading stations");

        for station in stations {
            self.spawn_station(station).await;
        }
    }

    /// Spawn a long-lived task that connects, samples on the station's
    /// subscription interval, and automatically reconnects when the link
    /// drops.
    async fn spawn_station(&self, station: Station) {
        let station_id = station.id;
        let link = (self.link_factory)(&station);
        let station_cancel = self.cancel.child_token();
        let pool = self.pool.clone();
        let bus = Arc::clone(&self.bus);
        let cancel_clone = station_cancel.clone();
        let link_clone = Arc::clone(&link);
        let name = station.name.clone();
        let interval = Duration::from_millis(station.subscription_interval_ms.max(100) as u64);

        let task_handle = tokio::spawn(async move {
            tracing::info!(station_id, name = %name, "Starting polling task");
            run_station_loop(&*link_clone, station_id, interval, &pool, &bus, &cancel_clone).await;
            link_clone.disconnect().await;
            tracing::info!(station_id, "Polling task exited");
        });

        let managed = ManagedStation {
            link,
            task_handle,
            cancel: station_cancel,
        };

        self.stations.write().await.insert(station_id, managed);
    }
}

/// Core polling loop: connect -> sample on interval -> reconnect.
///
/// Runs until the cancellation token is triggered.
async fn run_station_loop(
    link: &dyn StationLink,
    station_id: DbId,
    interval: Duration,
    pool: &PgPool,
    bus: &EventBus,
    cancel: &CancellationToken,
) {
    let reconnect_config = ReconnectConfig::default();

    loop {
        // Attempt to connect (or reconnect).
        if let Err(e) = link.connect().await {
            tracing::warn!(station_id, error = %e, "Connection failed, entering reconnect loop");
            if !reconnect_with_escalation(link, station_id, &reconnect_config, pool, cancel).await {
                return; // cancelled
            }
        }

        mark_online(pool, bus, station_id).await;

        // Sample until the link drops or we are cancelled.
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let link_error = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    mark_offline(pool, bus, station_id, None).await;
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = sample_station(pool, bus, station_id, link).await {
                        break e;
                    }
                }
            }
        };

        tracing::warn!(station_id, error = %link_error, "Station link lost");
        mark_offline(pool, bus, station_id, Some(&link_error)).await;

        if cancel.is_cancelled() {
            return;
        }

        if !reconnect_with_escalation(link, station_id, &reconnect_config, pool, cancel).await {
            return; // cancelled
        }
        mark_online(pool, bus, station_id).await;
    }
}

/// Reconnect, escalating the station to `Faulty` once the bounded first
/// burst of attempts is used up. Retrying then continues unbounded.
///
/// Returns `false` only on cancellation.
async fn reconnect_with_escalation(
    link: &dyn StationLink,
    station_id: DbId,
    config: &ReconnectConfig,
    pool: &PgPool,
    cancel: &CancellationToken,
) -> bool {
    match reconnect_burst(link, station_id, config, cancel, config.faulty_after_attempts).await {
        ReconnectOutcome::Connected => return true,
        ReconnectOutcome::Cancelled => return false,
        ReconnectOutcome::Exhausted => {
            mark_faulty(pool, station_id, config.faulty_after_attempts).await;
        }
    }
    reconnect_loop(link, station_id, config, cancel).await
}

async fn mark_online(pool: &PgPool, bus: &EventBus, station_id: DbId) {
    if let Err(e) =
        StationRepo::set_connection_status(pool, station_id, ConnectionStatus::Connected.as_str(), true)
            .await
    {
        tracing::error!(station_id, error = %e, "Failed to record connection");
    }
    bus.publish(SystemEvent::new(EVENT_STATION_CONNECTED).with_source("station", station_id));
}

async fn mark_offline(pool: &PgPool, bus: &EventBus, station_id: DbId, error: Option<&LinkError>) {
    if let Err(e) = StationRepo::set_connection_status(
        pool,
        station_id,
        ConnectionStatus::Disconnected.as_str(),
        false,
    )
    .await
    {
        tracing::error!(station_id, error = %e, "Failed to record disconnection");
    }
    if let Some(link_error) = error {
        let alarm = CreateAlarm {
            station_id: Some(station_id),
            node_id: None,
            severity: "Critical".to_string(),
            message: format!("Station connection lost: {link_error}"),
        };
        if let Err(e) = AlarmRepo::insert(pool, &alarm).await {
            tracing::error!(station_id, error = %e, "Failed to raise disconnection alarm");
        }
    }
    bus.publish(SystemEvent::new(EVENT_STATION_DISCONNECTED).with_source("station", station_id));
}

async fn mark_faulty(pool: &PgPool, station_id: DbId, attempts: u32) {
    tracing::error!(
        station_id,
        attempts,
        "Station unreachable after repeated reconnect attempts, marking faulty"
    );
    if let Err(e) =
        StationRepo::set_connection_status(pool, station_id, ConnectionStatus::Faulty.as_str(), false)
            .await
    {
        tracing::error!(station_id, error = %e, "Failed to record faulty status");
    }
}

/// Errors that can occur when interacting with the manager.
#[derive(Debug, thiserror::Error)]
pub enum StationManagerError {
    /// The station is not loaded (inactive, deleted, or never started).
    #[error("Station {0} is not managed or not connected")]
    StationNotManaged(DbId),

    /// The underlying link rejected the operation.
    #[error(transparent)]
    Link(#[from] LinkError),
}

//! Sweeper for overdue pending control change requests.
//!
//! The server clock is the single source of truth for request expiry.
//! Clients get `expires_in_seconds` as a display hint, but only this
//! sweeper (and the expiry checks in the confirm handler) decide when a
//! pending request actually lapses.

use std::time::Duration;

use broms_core::control::ChangeType;
use broms_db::repositories::{ControlHistoryRepo, ControlRequestRepo};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the sweeper looks for overdue requests.
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Run the expiry sweeper until cancelled.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!("Request expiry sweeper started");
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Request expiry sweeper stopped");
                return;
            }
            _ = ticker.tick() => {
                sweep(&pool).await;
            }
        }
    }
}

/// One sweep: flip overdue pending requests to `expired` and record a
/// `timeout` history row for each.
async fn sweep(pool: &PgPool) {
    let expired = match ControlRequestRepo::expire_overdue(pool).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to expire overdue requests");
            return;
        }
    };

    if expired.is_empty() {
        return;
    }

    tracing::info!(count = expired.len(), "Expired overdue control requests");

    for request in expired {
        if let Err(e) = ControlHistoryRepo::append(
            pool,
            request.control_state_id,
            ChangeType::Timeout.as_str(),
            None,
            Some(request.requested_value.as_str()),
            None,
            Some("confirmation window elapsed"),
        )
        .await
        {
            tracing::error!(
                request_id = request.id,
                error = %e,
                "Failed to record timeout history"
            );
        }
    }
}

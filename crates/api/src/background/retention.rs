//! Periodic cleanup of aged alarms and breaches per the retention policy.

use std::time::Duration;

use broms_db::repositories::{AlarmRepo, BreachRepo, RetentionRepo, SessionRepo};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the cleanup runs. Retention is measured in days, so an
/// hourly cadence is more than enough.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

/// Run retention cleanup until cancelled.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!("Retention cleanup job started");
    let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Retention cleanup job stopped");
                return;
            }
            _ = ticker.tick() => {
                cleanup(&pool).await;
            }
        }
    }
}

/// One cleanup pass: alarms, breaches (honoring `keep_unacknowledged`),
/// and expired user sessions.
async fn cleanup(pool: &PgPool) {
    let policy = match RetentionRepo::get(pool).await {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load retention policy");
            return;
        }
    };

    match AlarmRepo::cleanup_older_than(pool, policy.alarm_retention_days).await {
        Ok(0) => {}
        Ok(deleted) => tracing::info!(deleted, "Deleted aged alarms"),
        Err(e) => tracing::error!(error = %e, "Alarm cleanup failed"),
    }

    match BreachRepo::cleanup_older_than(
        pool,
        policy.breach_retention_days,
        policy.keep_unacknowledged,
    )
    .await
    {
        Ok(0) => {}
        Ok(deleted) => tracing::info!(deleted, "Deleted aged breaches"),
        Err(e) => tracing::error!(error = %e, "Breach cleanup failed"),
    }

    match SessionRepo::cleanup_expired(pool).await {
        Ok(0) => {}
        Ok(deleted) => tracing::info!(deleted, "Deleted expired sessions"),
        Err(e) => tracing::error!(error = %e, "Session cleanup failed"),
    }
}

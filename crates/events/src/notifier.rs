//! Breach notification task.
//!
//! Subscribes to the event bus and mails every detected breach to the
//! recipients whose minimum alert level matches. When SMTP is not
//! configured the task still drains the bus but only logs, so the rest of
//! the service behaves identically with or without a mailer.

use sqlx::PgPool;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use broms_db::repositories::{NotificationRepo, StationRepo};

use crate::bus::{EventBus, SystemEvent, EVENT_BREACH_DETECTED};
use crate::delivery::email::{BreachEmail, EmailConfig, EmailDelivery};

/// Background task that turns `breach.detected` events into emails.
pub struct BreachNotifier {
    pool: PgPool,
    delivery: Option<EmailDelivery>,
}

impl BreachNotifier {
    /// Build a notifier. The mailer is constructed only when SMTP is
    /// configured in the environment.
    pub fn from_env(pool: PgPool) -> Self {
        let delivery = match EmailConfig::from_env() {
            Some(config) => {
                tracing::info!(host = %config.smtp_host, "Email delivery configured");
                Some(EmailDelivery::new(config))
            }
            None => {
                tracing::info!("SMTP_HOST not set, breach emails disabled");
                None
            }
        };
        Self { pool, delivery }
    }

    /// Subscribe to the bus and process events until cancellation.
    pub async fn run(self, bus: &EventBus, cancel: CancellationToken) {
        let mut rx = bus.subscribe();
        tracing::info!("Breach notifier started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Breach notifier shutting down");
                    break;
                }
                received = rx.recv() => match received {
                    Ok(event) if event.event_type == EVENT_BREACH_DETECTED => {
                        self.handle_breach(&event).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Breach notifier lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    async fn handle_breach(&self, event: &SystemEvent) {
        let level = event.payload["level"].as_str().unwrap_or("Warning");

        let recipients = match NotificationRepo::list_enabled_for_level(&self.pool, level).await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load notification recipients");
                return;
            }
        };

        if recipients.is_empty() {
            return;
        }

        let Some(delivery) = &self.delivery else {
            tracing::debug!(
                recipients = recipients.len(),
                level,
                "Breach detected but email delivery is disabled"
            );
            return;
        };

        let station = match event.payload["station_id"].as_i64() {
            Some(station_id) => StationRepo::find_by_id(&self.pool, station_id)
                .await
                .ok()
                .flatten()
                .map(|s| s.name),
            None => None,
        };

        let breach = BreachEmail {
            station: station.as_deref().unwrap_or("unknown station"),
            node: event.payload["node"].as_str().unwrap_or("unknown node"),
            level,
            value: event.payload["value"].as_str().unwrap_or(""),
            threshold: event.payload["threshold"].as_f64(),
            observed_at: event.timestamp,
        };

        for recipient in recipients {
            if let Err(e) = delivery.deliver_breach(&recipient.email, &breach).await {
                tracing::error!(to = %recipient.email, error = %e, "Breach email failed");
            }
        }
    }
}

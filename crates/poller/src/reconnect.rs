//! Exponential-backoff reconnection for station links.
//!
//! When a station's link drops, the manager first runs a bounded
//! [`reconnect_burst`]; if every attempt in the burst fails the station is
//! escalated to `Faulty` and [`reconnect_loop`] keeps retrying unbounded
//! until either the session is restored or the [`CancellationToken`] is
//! triggered.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use broms_core::types::DbId;

use crate::link::StationLink;

/// Tunable parameters for the exponential-backoff strategy.
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Consecutive failures before the station is reported faulty.
    pub faulty_after_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            faulty_after_attempts: 5,
        }
    }
}

/// Result of a bounded run of reconnection attempts.
#[derive(Debug, PartialEq, Eq)]
pub enum ReconnectOutcome {
    /// The link came back.
    Connected,
    /// The cancellation token fired first.
    Cancelled,
    /// Every attempt in the burst failed.
    Exhausted,
}

/// Calculate the next backoff delay from the current delay and config.
///
/// The result is clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Run up to `max_attempts` reconnection attempts with exponential backoff.
pub async fn reconnect_burst(
    link: &dyn StationLink,
    station_id: DbId,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
    max_attempts: u32,
) -> ReconnectOutcome {
    let mut delay = config.initial_delay;

    for attempt in 1..=max_attempts {
        tracing::info!(
            station_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to station",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(station_id, "Reconnect cancelled");
                return ReconnectOutcome::Cancelled;
            }
            result = link.connect() => {
                match result {
                    Ok(()) => {
                        tracing::info!(station_id, attempt, "Reconnected to station");
                        return ReconnectOutcome::Connected;
                    }
                    Err(e) => {
                        tracing::warn!(station_id, error = %e, "Reconnect attempt {attempt} failed");
                    }
                }
            }
        }

        // Wait before the next attempt, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => return ReconnectOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, config);
    }

    ReconnectOutcome::Exhausted
}

/// Retry until a connection succeeds or the token fires.
///
/// Returns `true` once a connection succeeds, or `false` if the `cancel`
/// token is triggered before a successful connection.
pub async fn reconnect_loop(
    link: &dyn StationLink,
    station_id: DbId,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> bool {
    loop {
        match reconnect_burst(link, station_id, config, cancel, u32::MAX).await {
            ReconnectOutcome::Connected => return true,
            ReconnectOutcome::Cancelled => return false,
            ReconnectOutcome::Exhausted => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{LinkError, SimulatedLink, StationLink};
    use async_trait::async_trait;

    /// A link whose endpoint never answers.
    struct DeadLink;

    #[async_trait]
    impl StationLink for DeadLink {
        async fn connect(&self) -> Result<(), LinkError> {
            Err(LinkError::ConnectionFailed("no route to host".into()))
        }
        async fn read(&self, _address: &str) -> Result<String, LinkError> {
            Err(LinkError::NotConnected)
        }
        async fn write(&self, _address: &str, _value: &str) -> Result<(), LinkError> {
            Err(LinkError::NotConnected)
        }
        async fn disconnect(&self) {}
    }

    fn fast_config() -> ReconnectConfig {
        ReconnectConfig {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
            faulty_after_attempts: 3,
        }
    }

    #[test]
    fn next_delay_doubles() {
        let config = ReconnectConfig::default();
        let d = next_delay(Duration::from_secs(1), &config);
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = ReconnectConfig {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        let d = next_delay(Duration::from_secs(8), &config);
        assert_eq!(d, Duration::from_secs(10));
    }

    #[test]
    fn full_backoff_sequence() {
        let config = ReconnectConfig::default();
        let mut delay = config.initial_delay;
        let expected = [1, 2, 4, 8, 16, 30, 30, 30];

        for &expected_secs in &expected {
            assert_eq!(delay.as_secs(), expected_secs);
            delay = next_delay(delay, &config);
        }
    }

    #[tokio::test]
    async fn cancellation_token_stops_reconnect() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let link = SimulatedLink::new(1);
        let config = ReconnectConfig::default();

        assert!(!reconnect_loop(&link, 1, &config, &cancel).await);
    }

    #[tokio::test]
    async fn reconnect_succeeds_on_first_attempt() {
        let cancel = CancellationToken::new();
        let link = SimulatedLink::new(1);
        let config = ReconnectConfig::default();

        assert!(reconnect_loop(&link, 1, &config, &cancel).await);
    }

    #[tokio::test]
    async fn burst_exhausts_against_a_dead_endpoint() {
        let cancel = CancellationToken::new();
        let config = fast_config();

        let outcome =
            reconnect_burst(&DeadLink, 1, &config, &cancel, config.faulty_after_attempts).await;
        assert_eq!(outcome, ReconnectOutcome::Exhausted);
    }

    #[tokio::test]
    async fn burst_connects_within_the_attempt_budget() {
        let cancel = CancellationToken::new();
        let config = fast_config();
        let link = SimulatedLink::new(1);

        let outcome = reconnect_burst(&link, 1, &config, &cancel, 3).await;
        assert_eq!(outcome, ReconnectOutcome::Connected);
    }
}

//! Station configuration rules.
//!
//! A station is a remote pump/borehole site reachable over an OPC UA
//! endpoint. Besides the endpoint URL itself, the per-station timeout knobs
//! have ordering constraints that would otherwise cause silent connection
//! trouble in the field, so they are validated together on create/update.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Connectivity status reported for a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Faulty,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Faulty => "Faulty",
        }
    }
}

/// Security policies the station endpoint may require.
pub const SECURITY_POLICIES: &[&str] =
    &["None", "Basic128Rsa15", "Basic256", "Basic256Sha256"];

/// Message security modes.
pub const SECURITY_MODES: &[&str] = &["None", "Sign", "SignAndEncrypt"];

/// Connection tuning for a station, all in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct StationTimeouts {
    pub session_ms: i32,
    pub secure_ms: i32,
    pub connection_ms: i32,
    pub request_ms: i32,
    pub acknowledge_ms: i32,
    pub subscription_interval_ms: i32,
}

impl Default for StationTimeouts {
    fn default() -> Self {
        Self {
            session_ms: 60_000,
            secure_ms: 10_000,
            connection_ms: 5_000,
            request_ms: 10_000,
            acknowledge_ms: 5_000,
            subscription_interval_ms: 5_000,
        }
    }
}

/// Validate that an endpoint URL is an OPC UA TCP endpoint.
pub fn validate_endpoint_url(url: &str) -> Result<(), CoreError> {
    if !url.starts_with("opc.tcp://") {
        return Err(CoreError::Validation(
            "Endpoint URL must start with 'opc.tcp://'".into(),
        ));
    }
    if url.len() <= "opc.tcp://".len() {
        return Err(CoreError::Validation("Endpoint URL is missing a host".into()));
    }
    Ok(())
}

/// Validate that a security policy and mode are a consistent pair.
///
/// A policy without a mode (or vice versa) is a misconfiguration the OPC UA
/// handshake would reject much later with an opaque error.
pub fn validate_security(policy: &str, mode: &str) -> Result<(), CoreError> {
    if !SECURITY_POLICIES.contains(&policy) {
        return Err(CoreError::Validation(format!(
            "Unknown security policy '{policy}'"
        )));
    }
    if !SECURITY_MODES.contains(&mode) {
        return Err(CoreError::Validation(format!("Unknown security mode '{mode}'")));
    }
    if policy != "None" && mode == "None" {
        return Err(CoreError::Validation(
            "A security mode must be selected when a security policy is applied".into(),
        ));
    }
    if mode != "None" && policy == "None" {
        return Err(CoreError::Validation(
            "A security policy must be selected when a security mode is applied".into(),
        ));
    }
    Ok(())
}

/// Validate timeout ordering constraints.
///
/// - The session must outlive the initial connection attempt.
/// - A request cannot wait longer than the session lasts.
/// - With security enabled, the secure-channel timeout must cover the
///   connection timeout since the handshake takes longer.
pub fn validate_timeouts(t: &StationTimeouts, security_enabled: bool) -> Result<(), CoreError> {
    if t.session_ms <= t.connection_ms {
        return Err(CoreError::Validation(format!(
            "Session timeout ({}ms) must be greater than connection timeout ({}ms)",
            t.session_ms, t.connection_ms
        )));
    }
    if t.request_ms > t.session_ms {
        return Err(CoreError::Validation(format!(
            "Request timeout ({}ms) must not exceed session timeout ({}ms)",
            t.request_ms, t.session_ms
        )));
    }
    if security_enabled && t.secure_ms < t.connection_ms {
        return Err(CoreError::Validation(format!(
            "Secure channel timeout ({}ms) must be at least the connection timeout ({}ms)",
            t.secure_ms, t.connection_ms
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_must_be_opc_tcp() {
        assert!(validate_endpoint_url("opc.tcp://station-alpha:4840").is_ok());
        assert!(validate_endpoint_url("http://station-alpha").is_err());
        assert!(validate_endpoint_url("opc.tcp://").is_err());
    }

    #[test]
    fn security_policy_and_mode_must_pair() {
        assert!(validate_security("None", "None").is_ok());
        assert!(validate_security("Basic256", "Sign").is_ok());
        assert!(validate_security("Basic256", "None").is_err());
        assert!(validate_security("None", "Sign").is_err());
        assert!(validate_security("Bogus", "Sign").is_err());
    }

    #[test]
    fn timeout_ordering_is_enforced() {
        let mut t = StationTimeouts::default();
        assert!(validate_timeouts(&t, false).is_ok());

        t.connection_ms = 70_000; // exceeds the 60s session
        assert!(validate_timeouts(&t, false).is_err());

        let mut t = StationTimeouts::default();
        t.request_ms = 90_000;
        assert!(validate_timeouts(&t, false).is_err());

        let mut t = StationTimeouts::default();
        t.secure_ms = 1_000;
        assert!(validate_timeouts(&t, false).is_ok(), "secure timeout unchecked without security");
        assert!(validate_timeouts(&t, true).is_err());
    }
}

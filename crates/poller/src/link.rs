//! Station transport seam.
//!
//! The OPC UA wire protocol lives outside this repository. [`StationLink`]
//! is the boundary: the manager and sampler only ever talk to a link, and
//! the default implementation is a deterministic simulator. A real
//! transport plugs in through [`crate::manager::LinkFactory`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use broms_core::node_id::NodeAddress;

/// Errors surfaced by a station link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The endpoint could not be reached or the session was rejected.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A read or write was attempted without an established connection.
    #[error("Link is not connected")]
    NotConnected,

    /// The node address was rejected by the endpoint.
    #[error("Bad node address '{0}'")]
    BadAddress(String),

    /// The write was refused (type mismatch, access denied, timeout).
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Transport to a single station.
#[async_trait]
pub trait StationLink: Send + Sync {
    /// Establish (or re-establish) the session.
    async fn connect(&self) -> Result<(), LinkError>;

    /// Read the raw value of a node by its `ns=<n>;i=<n>` address.
    async fn read(&self, address: &str) -> Result<String, LinkError>;

    /// Write a raw value to a node.
    async fn write(&self, address: &str, value: &str) -> Result<(), LinkError>;

    /// Tear the session down. Must be idempotent.
    async fn disconnect(&self);
}

/// Deterministic in-memory link used when no real transport is wired in.
///
/// Reads produce a slowly varying value derived from the node identifier
/// and the current minute, so dashboards show plausible, repeatable data.
/// Writes are accepted and echoed back on subsequent reads.
pub struct SimulatedLink {
    station_id: i64,
    connected: AtomicBool,
    written: tokio::sync::RwLock<std::collections::HashMap<String, String>>,
}

impl SimulatedLink {
    pub fn new(station_id: i64) -> Self {
        Self {
            station_id,
            connected: AtomicBool::new(false),
            written: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    fn simulated_value(&self, addr: &NodeAddress) -> String {
        let minute = chrono::Utc::now().timestamp() / 60;
        let seed = self.station_id
            + i64::from(addr.namespace) * 31
            + i64::from(addr.identifier) * 7
            + minute;
        // A bounded sawtooth in [0, 100) with one decimal.
        let whole = (seed % 100 + 100) % 100;
        let tenth = (seed % 10 + 10) % 10;
        format!("{whole}.{tenth}")
    }
}

#[async_trait]
impl StationLink for SimulatedLink {
    async fn connect(&self) -> Result<(), LinkError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn read(&self, address: &str) -> Result<String, LinkError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(LinkError::NotConnected);
        }
        let addr = NodeAddress::parse(address)
            .map_err(|_| LinkError::BadAddress(address.to_string()))?;
        if let Some(value) = self.written.read().await.get(address) {
            return Ok(value.clone());
        }
        Ok(self.simulated_value(&addr))
    }

    async fn write(&self, address: &str, value: &str) -> Result<(), LinkError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(LinkError::NotConnected);
        }
        NodeAddress::parse(address).map_err(|_| LinkError::BadAddress(address.to_string()))?;
        self.written
            .write()
            .await
            .insert(address.to_string(), value.to_string());
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_requires_connection() {
        let link = SimulatedLink::new(1);
        assert!(matches!(
            link.read("ns=2;i=100").await,
            Err(LinkError::NotConnected)
        ));
        link.connect().await.unwrap();
        assert!(link.read("ns=2;i=100").await.is_ok());
    }

    #[tokio::test]
    async fn write_is_echoed_on_read() {
        let link = SimulatedLink::new(1);
        link.connect().await.unwrap();
        link.write("ns=2;i=200", "true").await.unwrap();
        assert_eq!(link.read("ns=2;i=200").await.unwrap(), "true");
    }

    #[tokio::test]
    async fn bad_addresses_are_rejected() {
        let link = SimulatedLink::new(1);
        link.connect().await.unwrap();
        assert!(matches!(
            link.read("not-an-address").await,
            Err(LinkError::BadAddress(_))
        ));
        assert!(matches!(
            link.write("ns=2", "1").await,
            Err(LinkError::BadAddress(_))
        ));
    }

    #[tokio::test]
    async fn simulated_values_parse_as_numbers() {
        let link = SimulatedLink::new(7);
        link.connect().await.unwrap();
        let value = link.read("ns=2;i=345").await.unwrap();
        let parsed: f64 = value.parse().expect("simulated value should be numeric");
        assert!((0.0..100.0).contains(&parsed));
    }
}

//! Station polling: connection management, sampling and control writes.
//!
//! [`StationManager`] owns a long-lived task per active station that
//! connects, samples the station's nodes on its subscription interval, and
//! reconnects with capped backoff when the link drops. Transport sits
//! behind the [`StationLink`] trait; the default link is a deterministic
//! simulator so the service runs on hosts with no reachable PLC.

pub mod link;
pub mod manager;
pub mod reconnect;
pub mod sampler;

pub use link::{LinkError, SimulatedLink, StationLink};
pub use manager::{StationManager, StationManagerError};

//! Request handlers, one module per resource.

pub mod alarms;
pub mod auth;
pub mod breaches;
pub mod controls;
pub mod nodes;
pub mod recipients;
pub mod retention;
pub mod stations;
pub mod tags;
pub mod telemetry;
pub mod thresholds;
pub mod users;
pub mod vpn;

//! Domain logic for the BROMS monitoring backend.
//!
//! Pure types and rules shared by the database, poller, and API crates:
//! control-change workflow states, threshold evaluation, sampling rules,
//! station/node validation, and uptime arithmetic. Nothing in here touches
//! the network or the database.

pub mod control;
pub mod error;
pub mod node_id;
pub mod roles;
pub mod sampling;
pub mod station;
pub mod threshold;
pub mod types;
pub mod uptime;

//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod alarm;
pub mod breach;
pub mod control;
pub mod node;
pub mod notification;
pub mod retention;
pub mod role;
pub mod session;
pub mod station;
pub mod tag;
pub mod telemetry;
pub mod user;
pub mod vpn;

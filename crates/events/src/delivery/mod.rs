//! External delivery channels for system events.

pub mod email;

//! Background maintenance jobs spawned at startup.
//!
//! Each job is a long-running `async fn run(pool, cancel)` driven by a
//! `tokio::time::interval` and stopped via its [`CancellationToken`].

pub mod request_expiry;
pub mod retention;

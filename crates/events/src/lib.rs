//! BROMS event bus and notification infrastructure.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`SystemEvent`] — the canonical domain event envelope.
//! - [`delivery`] — external delivery channels (email).
//! - [`BreachNotifier`] — background task that mails breach notifications
//!   to subscribed recipients.

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{EventBus, SystemEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use notifier::BreachNotifier;

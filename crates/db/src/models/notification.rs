//! Notification recipient model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::types::{DbId, Timestamp};

/// A notification recipient row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRecipient {
    pub id: DbId,
    pub email: String,
    pub name: String,
    /// Minimum breach level that triggers an email (`"Warning"` or
    /// `"Critical"`).
    pub min_level: String,
    pub enabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for subscribing a recipient.
#[derive(Debug, Deserialize)]
pub struct CreateRecipient {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_min_level")]
    pub min_level: String,
}

fn default_min_level() -> String {
    "Warning".to_string()
}

/// DTO for updating a recipient. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateRecipient {
    pub email: Option<String>,
    pub name: Option<String>,
    pub min_level: Option<String>,
    pub enabled: Option<bool>,
}

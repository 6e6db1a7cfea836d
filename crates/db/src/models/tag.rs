//! Tag model (named measurement with engineering units).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use broms_core::types::{DbId, Timestamp};

/// A tag row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub unit: String,
    pub description: String,
    pub created_at: Timestamp,
}

/// DTO for creating a tag.
#[derive(Debug, Deserialize)]
pub struct CreateTag {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
}

//! Role model.

use serde::Serialize;
use sqlx::FromRow;

use broms_core::types::{DbId, Timestamp};

/// A role row from the `roles` table. Seeded by migration; not user-editable.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
}

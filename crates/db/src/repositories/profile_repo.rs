//! Repository for the `user_profiles` table.

use sqlx::PgPool;

use broms_core::types::DbId;

use crate::models::user::{UpdateProfile, UserProfile};

const COLUMNS: &str =
    "id, user_id, phone, organization, receive_alerts, created_at, updated_at";

/// Provides access to user contact profiles.
pub struct ProfileRepo;

impl ProfileRepo {
    /// Fetch a user's profile, creating an empty one on first access.
    pub async fn find_or_create(pool: &PgPool, user_id: DbId) -> Result<UserProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_profiles (user_id) VALUES ($1)
             ON CONFLICT ON CONSTRAINT uq_user_profiles_user DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Update a profile. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        let query = format!(
            "UPDATE user_profiles SET
                phone = COALESCE($2, phone),
                organization = COALESCE($3, organization),
                receive_alerts = COALESCE($4, receive_alerts)
             WHERE user_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserProfile>(&query)
            .bind(user_id)
            .bind(&input.phone)
            .bind(&input.organization)
            .bind(input.receive_alerts)
            .fetch_optional(pool)
            .await
    }
}

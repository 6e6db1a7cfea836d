//! Role gates layered on top of [`AuthUser`].
//!
//! Routes state their minimum role by taking one of these extractors;
//! a caller below the bar gets 403 before the handler body runs. Finer
//! per-control grants are checked separately in the control handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use broms_core::error::CoreError;
use broms_core::roles::{ROLE_ADMIN, ROLE_OPERATOR};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

fn forbidden(needed: &str) -> AppError {
    AppError::Core(CoreError::Forbidden(format!("{needed} role required")))
}

/// Admin only.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(forbidden("Admin"));
        }
        Ok(RequireAdmin(user))
    }
}

/// Operator or admin.
pub struct RequireOperator(pub AuthUser);

impl FromRequestParts<AppState> for RequireOperator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN && user.role != ROLE_OPERATOR {
            return Err(forbidden("Operator or Admin"));
        }
        Ok(RequireOperator(user))
    }
}

/// Any authenticated user. Same effect as taking [`AuthUser`] directly,
/// but reads consistently next to the other gates in route signatures.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}

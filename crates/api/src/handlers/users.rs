//! Admin user management handlers (`/admin/users`).

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use broms_core::error::CoreError;
use broms_core::types::DbId;
use broms_db::models::user::{
    CreateUser, UpdateProfile, UpdateUser, User, UserProfile, UserResponse,
};
use broms_db::repositories::{ProfileRepo, RoleRepo, SessionRepo, UserRepo};

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Minimum accepted password length for created/reset passwords.
const MIN_PASSWORD_LENGTH: usize = 12;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    /// Role name: `"admin"`, `"operator"` or `"viewer"`.
    pub role: String,
}

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /admin/users/{id}/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    let roles: HashMap<DbId, String> = RoleRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();

    let data = users
        .into_iter()
        .map(|u| to_response(u, &roles))
        .collect();

    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role = RoleRepo::find_by_name(&state.pool, &input.role)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "Unknown role '{}'",
                input.role
            )))
        })?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
            role_id: role.id,
        },
    )
    .await?;

    let mut roles = HashMap::new();
    roles.insert(role.id, role.name);

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: to_response(user, &roles),
        }),
    ))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    let mut roles = HashMap::new();
    roles.insert(user.role_id, role);

    Ok(Json(DataResponse {
        data: to_response(user, &roles),
    }))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let role_id = match &input.role {
        Some(name) => Some(
            RoleRepo::find_by_name(&state.pool, name)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Validation(format!("Unknown role '{name}'")))
                })?
                .id,
        ),
        None => None,
    };

    let update = UpdateUser {
        username: input.username,
        email: input.email,
        role_id,
        is_active: input.is_active,
    };

    let user = UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    let mut roles = HashMap::new();
    roles.insert(user.role_id, role);

    Ok(Json(DataResponse {
        data: to_response(user, &roles),
    }))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Soft-deactivates the account and revokes its sessions. Returns 204.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if admin.user_id == id {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot deactivate your own account".into(),
        )));
    }

    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/{id}/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, id, &password_hash).await? {
        return Err(AppError::Core(CoreError::NotFound { entity: "User", id }));
    }

    // Force re-authentication everywhere after a password reset.
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/users/{id}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserProfile>>> {
    ensure_user_exists(&state, id).await?;
    let profile = ProfileRepo::find_or_create(&state.pool, id).await?;
    Ok(Json(DataResponse { data: profile }))
}

/// PUT /api/v1/admin/users/{id}/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProfile>,
) -> AppResult<Json<DataResponse<UserProfile>>> {
    ensure_user_exists(&state, id).await?;
    ProfileRepo::find_or_create(&state.pool, id).await?;
    let profile = ProfileRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Profile",
            id,
        }))?;
    Ok(Json(DataResponse { data: profile }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_user_exists(state: &AppState, id: DbId) -> AppResult<()> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(())
}

fn to_response(user: User, roles: &HashMap<DbId, String>) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: roles
            .get(&user.role_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
        role_id: user.role_id,
        is_active: user.is_active,
        last_login_at: user.last_login_at,
        created_at: user.created_at,
    }
}

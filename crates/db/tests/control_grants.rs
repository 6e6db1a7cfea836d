//! Integration tests for control permission grants and request expiry.
//!
//! Covers: re-granting replaces the previous grant instead of stacking
//! (including global grants with no control bound), effective-level
//! resolution across global and per-control grants, expired grants being
//! ignored, and the expiry sweep over overdue pending requests.

use sqlx::PgPool;
use uuid::Uuid;

use broms_db::models::control::{CreateControlPermission, CreateControlState};
use broms_db::models::node::CreateNode;
use broms_db::models::station::CreateStation;
use broms_db::models::user::CreateUser;
use broms_db::repositories::{
    ControlPermissionRepo, ControlRepo, ControlRequestRepo, NodeRepo, RoleRepo, StationRepo,
    UserRepo,
};

async fn new_station(pool: &PgPool) -> broms_db::models::station::Station {
    StationRepo::create(
        pool,
        &CreateStation {
            name: "Aquifer East".to_string(),
            endpoint_url: "opc.tcp://10.1.0.20:4840".to_string(),
            security_policy: "None".to_string(),
            security_mode: "None".to_string(),
            auth_username: None,
            auth_password: None,
            session_timeout_ms: None,
            secure_channel_timeout_ms: None,
            connection_timeout_ms: None,
            request_timeout_ms: None,
            acknowledge_timeout_ms: None,
            subscription_interval_ms: None,
        },
    )
    .await
    .unwrap()
}

async fn new_control(
    pool: &PgPool,
    station_id: i64,
    node_address: &str,
) -> broms_db::models::control::ControlState {
    let node = NodeRepo::create(
        pool,
        &CreateNode {
            station_id,
            tag_id: None,
            node_address: node_address.to_string(),
            display_name: "Pump enable".to_string(),
            node_type: "control".to_string(),
            access_level: "write".to_string(),
            log_on_whole_change: false,
        },
    )
    .await
    .unwrap();

    ControlRepo::create(
        pool,
        &CreateControlState {
            station_id,
            node_id: node.id,
            name: "Pump enable".to_string(),
            description: String::new(),
            control_type: "boolean".to_string(),
            requires_confirmation: true,
            danger_level: 1,
            rate_limit_seconds: 0,
            confirmation_timeout_seconds: 300,
            min_value: None,
            max_value: None,
            allowed_values: None,
        },
    )
    .await
    .unwrap()
}

async fn new_operator(pool: &PgPool, username: &str) -> broms_db::models::user::User {
    let role = RoleRepo::find_by_name(pool, "operator").await.unwrap().unwrap();
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.net"),
            password_hash: "$argon2id$fake".to_string(),
            role_id: role.id,
        },
    )
    .await
    .unwrap()
}

fn grant_input(user_id: i64, control_state_id: Option<i64>, level: &str) -> CreateControlPermission {
    CreateControlPermission {
        user_id,
        control_state_id,
        permission_level: level.to_string(),
        expires_at: None,
    }
}

/// Re-granting a global permission replaces the old grant. A leftover row
/// at the old level would keep winning effective-level resolution, turning
/// a downgrade into a no-op.
#[sqlx::test(migrations = "./migrations")]
async fn global_regrant_replaces_instead_of_stacking(pool: PgPool) {
    let station = new_station(&pool).await;
    let control = new_control(&pool, station.id, "ns=2;i=710").await;
    let user = new_operator(&pool, "globalgrants").await;
    let admin = new_operator(&pool, "granter").await;

    ControlPermissionRepo::grant(&pool, &grant_input(user.id, None, "execute"), admin.id)
        .await
        .unwrap();
    ControlPermissionRepo::grant(&pool, &grant_input(user.id, None, "request"), admin.id)
        .await
        .unwrap();

    let rows: Vec<_> = ControlPermissionRepo::list(&pool)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.user_id == user.id)
        .collect();
    assert_eq!(rows.len(), 1, "second grant must replace the first");
    assert_eq!(rows[0].permission_level, "request");

    let level = ControlPermissionRepo::effective_level(&pool, user.id, control.id)
        .await
        .unwrap();
    assert_eq!(level.as_deref(), Some("request"), "downgrade must take effect");
}

/// The same replacement semantics hold for a grant bound to one control.
#[sqlx::test(migrations = "./migrations")]
async fn per_control_regrant_replaces_previous_level(pool: PgPool) {
    let station = new_station(&pool).await;
    let control = new_control(&pool, station.id, "ns=2;i=710").await;
    let user = new_operator(&pool, "boundgrants").await;
    let admin = new_operator(&pool, "granter2").await;

    ControlPermissionRepo::grant(
        &pool,
        &grant_input(user.id, Some(control.id), "execute"),
        admin.id,
    )
    .await
    .unwrap();
    ControlPermissionRepo::grant(
        &pool,
        &grant_input(user.id, Some(control.id), "view"),
        admin.id,
    )
    .await
    .unwrap();

    let level = ControlPermissionRepo::effective_level(&pool, user.id, control.id)
        .await
        .unwrap();
    assert_eq!(level.as_deref(), Some("view"));
}

/// An expired grant confers nothing; a live global grant covers controls
/// it was never explicitly bound to.
#[sqlx::test(migrations = "./migrations")]
async fn expired_grants_are_ignored(pool: PgPool) {
    let station = new_station(&pool).await;
    let control = new_control(&pool, station.id, "ns=2;i=710").await;
    let user = new_operator(&pool, "expiredgrant").await;
    let admin = new_operator(&pool, "granter3").await;

    let mut input = grant_input(user.id, Some(control.id), "execute");
    input.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(5));
    ControlPermissionRepo::grant(&pool, &input, admin.id).await.unwrap();

    let level = ControlPermissionRepo::effective_level(&pool, user.id, control.id)
        .await
        .unwrap();
    assert_eq!(level, None, "expired grant must not resolve");
}

/// The expiry sweep flips only overdue pending requests; a request still
/// inside its confirmation window is untouched.
#[sqlx::test(migrations = "./migrations")]
async fn expire_overdue_flips_only_overdue_requests(pool: PgPool) {
    let station = new_station(&pool).await;
    let overdue_control = new_control(&pool, station.id, "ns=2;i=711").await;
    let fresh_control = new_control(&pool, station.id, "ns=2;i=712").await;
    let user = new_operator(&pool, "requester").await;

    let overdue = ControlRequestRepo::create_pending(
        &pool,
        overdue_control.id,
        user.id,
        "true",
        None,
        Uuid::new_v4(),
        300,
    )
    .await
    .unwrap();
    let fresh = ControlRequestRepo::create_pending(
        &pool,
        fresh_control.id,
        user.id,
        "true",
        None,
        Uuid::new_v4(),
        300,
    )
    .await
    .unwrap();

    // Backdate one request past its confirmation window.
    sqlx::query(
        "UPDATE control_state_requests SET expires_at = NOW() - interval '1 minute' WHERE id = $1",
    )
    .bind(overdue.id)
    .execute(&pool)
    .await
    .unwrap();

    let flipped = ControlRequestRepo::expire_overdue(&pool).await.unwrap();
    assert_eq!(flipped.len(), 1);
    assert_eq!(flipped[0].id, overdue.id);
    assert_eq!(flipped[0].status, "expired");
    assert!(flipped[0].resolved_at.is_some());

    let untouched = ControlRequestRepo::find_by_id(&pool, fresh.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, "pending");
}

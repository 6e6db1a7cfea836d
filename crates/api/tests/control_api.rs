//! HTTP-level integration tests for the supervised control change workflow.
//!
//! Covers permission gating, the request -> confirm -> execute flow,
//! rate limiting, cancellation, confirmation-window expiry, name search,
//! and the audit history.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json, post_json_auth};
use broms_api::auth::password::hash_password;
use broms_core::types::DbId;
use broms_db::models::control::{CreateControlPermission, CreateControlState};
use broms_db::models::node::CreateNode;
use broms_db::models::station::CreateStation;
use broms_db::models::user::CreateUser;
use broms_db::repositories::{
    ControlPermissionRepo, ControlRepo, NodeRepo, StationRepo, UserRepo,
};
use sqlx::PgPool;

// Role ids as seeded by the migrations.
const ROLE_ADMIN: i64 = 1;
const ROLE_OPERATOR: i64 = 2;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Fixture {
    control_id: DbId,
    admin_token: String,
    operator_token: String,
    operator_id: DbId,
}

async fn create_user_with_password(pool: &PgPool, username: &str, role_id: i64) -> DbId {
    let hashed = hash_password("test_password_123!").expect("hashing should succeed");
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hashed,
        role_id,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
        .id
}

async fn login(pool: &PgPool, username: &str) -> String {
    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "username": username, "password": "test_password_123!" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}

/// Seed a station, a writable control node, a boolean control state, and an
/// admin + operator user. The station row exists before the app is built so
/// the station manager picks it up and connects the simulated link.
async fn seed(pool: &PgPool) -> Fixture {
    let station = StationRepo::create(
        pool,
        &CreateStation {
            name: "Borehole 7".to_string(),
            endpoint_url: "opc.tcp://10.0.0.7:4840".to_string(),
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
    .expect("station creation should succeed");

    let node = NodeRepo::create(
        pool,
        &CreateNode {
            station_id: station.id,
            tag_id: None,
            node_address: "ns=2;i=500".to_string(),
            display_name: "Pump enable".to_string(),
            node_type: "control".to_string(),
            access_level: "write".to_string(),
            log_on_whole_change: false,
        },
    )
    .await
    .expect("node creation should succeed");

    let control = ControlRepo::create(
        pool,
        &CreateControlState {
            station_id: station.id,
            node_id: node.id,
            name: "Pump enable".to_string(),
            description: "Main pump run command".to_string(),
            control_type: "boolean".to_string(),
            requires_confirmation: true,
            danger_level: 2,
            rate_limit_seconds: 60,
            confirmation_timeout_seconds: 300,
            min_value: None,
            max_value: None,
            allowed_values: None,
        },
    )
    .await
    .expect("control creation should succeed");

    create_user_with_password(pool, "ctrladmin", ROLE_ADMIN).await;
    let operator_id = create_user_with_password(pool, "ctrloperator", ROLE_OPERATOR).await;

    let admin_token = login(pool, "ctrladmin").await;
    let operator_token = login(pool, "ctrloperator").await;

    Fixture {
        control_id: control.id,
        admin_token,
        operator_token,
        operator_id,
    }
}

/// Grant the operator a request-level permission on every control.
async fn grant_request_level(pool: &PgPool, user_id: DbId, granted_by: DbId) {
    ControlPermissionRepo::grant(
        pool,
        &CreateControlPermission {
            user_id,
            control_state_id: None,
            permission_level: "request".to_string(),
            expires_at: None,
        },
        granted_by,
    )
    .await
    .expect("grant should succeed");
}

/// Build the app and give the station polling task a moment to connect the
/// simulated link, so execute-path writes do not race the connection.
async fn build_connected_app(pool: &PgPool) -> axum::Router {
    let app = common::build_test_app(pool.clone()).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    app
}

// ---------------------------------------------------------------------------
// Permission gating
// ---------------------------------------------------------------------------

/// An operator without any grant cannot request a change.
#[sqlx::test(migrations = "../db/migrations")]
async fn request_without_grant_is_forbidden(pool: PgPool) {
    let fx = seed(&pool).await;
    let app = common::build_test_app(pool).await;

    let body = serde_json::json!({ "requested_value": "true" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.operator_token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Only admins may confirm a pending request.
#[sqlx::test(migrations = "../db/migrations")]
async fn confirm_requires_admin(pool: PgPool) {
    let fx = seed(&pool).await;
    let app = common::build_test_app(pool).await;

    let body = serde_json::json!({
        "confirmation_token": "00000000-0000-0000-0000-000000000000"
    });
    let response = post_json_auth(
        app,
        "/api/v1/control-states/confirm-change",
        body,
        &fx.operator_token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Two-phase flow
// ---------------------------------------------------------------------------

/// Request-level operators go through confirmation: 202 with a pending
/// descriptor, one pending request at a time, and the admin's confirmation
/// executes the write and updates the control.
#[sqlx::test(migrations = "../db/migrations")]
async fn request_confirm_executes_change(pool: PgPool) {
    let fx = seed(&pool).await;
    let admin_id = UserRepo::find_by_username(&pool, "ctrladmin")
        .await
        .unwrap()
        .unwrap()
        .id;
    grant_request_level(&pool, fx.operator_id, admin_id).await;

    // Operator requests a change: pending, not yet applied.
    let app = build_connected_app(&pool).await;
    let body = serde_json::json!({ "requested_value": "true", "reason": "start irrigation" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body.clone(),
        &fx.operator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending_confirmation");
    assert!(json["data"]["request_id"].is_number());
    assert!(json["data"]["confirmation_token"].is_string());
    assert!(json["data"]["expires_in_seconds"].as_i64().unwrap() > 0);
    assert_eq!(json["data"]["danger_level"]["level"], 2);
    let token = json["data"]["confirmation_token"]
        .as_str()
        .unwrap()
        .to_string();

    // A second request while one is pending conflicts.
    let app = common::build_test_app(pool.clone()).await;
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.operator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Admin confirms: the write executes and the control updates.
    let app = build_connected_app(&pool).await;
    let response = post_json_auth(
        app,
        "/api/v1/control-states/confirm-change",
        serde_json::json!({ "confirmation_token": token }),
        &fx.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["current_value"], "true");
    assert_eq!(json["data"]["is_synced_with_plc"], true);

    // Every transition is in the audit history.
    let app = common::build_test_app(pool).await;
    let response = get_auth(
        app,
        &format!("/api/v1/control-states/{}/history", fx.control_id),
        &fx.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let change_types: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["change_type"].as_str().unwrap())
        .collect();
    assert!(change_types.contains(&"requested"));
    assert!(change_types.contains(&"confirmed"));
    assert!(change_types.contains(&"executed"));
}

/// Admins execute immediately even on controls requiring confirmation, and
/// the rate limit then rejects a follow-up change with a retry hint.
#[sqlx::test(migrations = "../db/migrations")]
async fn admin_executes_immediately_then_rate_limited(pool: PgPool) {
    let fx = seed(&pool).await;

    let app = build_connected_app(&pool).await;
    let body = serde_json::json!({ "requested_value": "true" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "executed");
    assert_eq!(json["data"]["control"]["current_value"], "true");

    // Change to a different value inside the rate-limit window -> 429.
    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({ "requested_value": "false" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let json = body_json(response).await;
    assert_eq!(json["code"], "RATE_LIMITED");
    assert!(json["retry_after"].as_f64().unwrap() > 0.0);
}

/// Values that do not fit the control type are rejected before anything is
/// written or recorded.
#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_value_is_rejected(pool: PgPool) {
    let fx = seed(&pool).await;
    let app = common::build_test_app(pool).await;

    let body = serde_json::json!({ "requested_value": "maybe" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.admin_token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// The requester can cancel a pending request; cancelling twice conflicts.
#[sqlx::test(migrations = "../db/migrations")]
async fn requester_cancels_pending_request(pool: PgPool) {
    let fx = seed(&pool).await;
    let admin_id = UserRepo::find_by_username(&pool, "ctrladmin")
        .await
        .unwrap()
        .unwrap()
        .id;
    grant_request_level(&pool, fx.operator_id, admin_id).await;

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "requested_value": "true" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.operator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    let request_id = json["data"]["request_id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone()).await;
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/requests/{request_id}/cancel"),
        serde_json::json!({}),
        &fx.operator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "cancelled");

    // Already resolved -> 409.
    let app = common::build_test_app(pool).await;
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/requests/{request_id}/cancel"),
        serde_json::json!({}),
        &fx.operator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// A request whose confirmation window has elapsed cannot be confirmed,
/// even before the background sweep has flipped it: the server clock
/// decides. The late confirmation expires the request and leaves a
/// `timeout` entry in the audit history.
#[sqlx::test(migrations = "../db/migrations")]
async fn confirm_after_expiry_conflicts_and_records_timeout(pool: PgPool) {
    let fx = seed(&pool).await;
    let admin_id = UserRepo::find_by_username(&pool, "ctrladmin")
        .await
        .unwrap()
        .unwrap()
        .id;
    grant_request_level(&pool, fx.operator_id, admin_id).await;

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "requested_value": "true" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.operator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    let request_id = json["data"]["request_id"].as_i64().unwrap();
    let token = json["data"]["confirmation_token"]
        .as_str()
        .unwrap()
        .to_string();

    // Push the request past its confirmation window.
    sqlx::query(
        "UPDATE control_state_requests SET expires_at = NOW() - interval '1 minute' WHERE id = $1",
    )
    .bind(request_id)
    .execute(&pool)
    .await
    .unwrap();

    let app = build_connected_app(&pool).await;
    let response = post_json_auth(
        app,
        "/api/v1/control-states/confirm-change",
        serde_json::json!({ "confirmation_token": token }),
        &fx.admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The request is now expired and nothing was written.
    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/control-requests", &fx.admin_token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["status"], "expired");

    let control = ControlRepo::find_by_id(&pool, fx.control_id)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(
        control.current_value, "true",
        "requested value must not reach the control"
    );

    let app = common::build_test_app(pool).await;
    let response = get_auth(
        app,
        &format!("/api/v1/control-states/{}/history", fx.control_id),
        &fx.admin_token,
    )
    .await;
    let json = body_json(response).await;
    let change_types: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["change_type"].as_str().unwrap())
        .collect();
    assert!(change_types.contains(&"timeout"));
    assert!(!change_types.contains(&"executed"));
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Name search over control states and nodes is a case-insensitive
/// substring match, and `%`/`_` in the term match themselves rather than
/// acting as wildcards.
#[sqlx::test(migrations = "../db/migrations")]
async fn search_is_case_insensitive_with_literal_wildcards(pool: PgPool) {
    let fx = seed(&pool).await;

    // Different case than the seeded "Pump enable".
    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/control-states?search=PUMP", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["name"], "Pump enable");

    // A literal `%` is not a match-everything wildcard.
    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/control-states?search=100%25", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    // A literal `_` is not a single-character wildcard.
    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/control-states?search=P_mp", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);

    // Node search covers display names the same way.
    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/nodes?search=ENABLE", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["display_name"], "Pump enable");

    let app = common::build_test_app(pool).await;
    let response = get_auth(app, "/api/v1/nodes?search=%25", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

/// Operators see only their own requests; admins see everyone's.
#[sqlx::test(migrations = "../db/migrations")]
async fn request_listing_is_scoped_by_role(pool: PgPool) {
    let fx = seed(&pool).await;
    let admin_id = UserRepo::find_by_username(&pool, "ctrladmin")
        .await
        .unwrap()
        .unwrap()
        .id;
    grant_request_level(&pool, fx.operator_id, admin_id).await;

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "requested_value": "true" });
    let response = post_json_auth(
        app,
        &format!("/api/v1/control-states/{}/request-change", fx.control_id),
        body,
        &fx.operator_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/control-requests", &fx.operator_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["requested_by"], fx.operator_id);
    // The confirmation token never leaks through listings.
    assert!(json["data"][0].get("confirmation_token").is_none());

    let app = common::build_test_app(pool).await;
    let response = get_auth(app, "/api/v1/control-requests", &fx.admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

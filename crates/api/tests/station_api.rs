//! HTTP-level integration tests for stations, thresholds, and the admin
//! resources (retention policy, VPN clients, notification recipients).

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json, post_json_auth, put_json_auth};
use broms_api::auth::password::hash_password;
use broms_db::models::user::CreateUser;
use broms_db::repositories::UserRepo;
use sqlx::PgPool;

// Role ids as seeded by the migrations.
const ROLE_ADMIN: i64 = 1;
const ROLE_VIEWER: i64 = 3;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn login_as(pool: &PgPool, username: &str, role_id: i64) -> String {
    let hashed = hash_password("test_password_123!").expect("hashing should succeed");
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hashed,
        role_id,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "username": username, "password": "test_password_123!" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}

fn station_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "endpoint_url": "opc.tcp://10.0.0.9:4840",
    })
}

// ---------------------------------------------------------------------------
// Station CRUD and reports
// ---------------------------------------------------------------------------

/// Creating a station with a malformed endpoint URL fails with 400.
#[sqlx::test(migrations = "../db/migrations")]
async fn station_with_bad_endpoint_is_rejected(pool: PgPool) {
    let token = login_as(&pool, "stationadmin", ROLE_ADMIN).await;
    let app = common::build_test_app(pool).await;

    let body = serde_json::json!({
        "name": "Bad endpoint",
        "endpoint_url": "http://not-opc.example.com",
    });
    let response = post_json_auth(app, "/api/v1/stations", body, &token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

/// A valid station is created, listed, and counted in the fleet summary.
#[sqlx::test(migrations = "../db/migrations")]
async fn station_create_and_summary(pool: PgPool) {
    let token = login_as(&pool, "stationadmin", ROLE_ADMIN).await;

    let app = common::build_test_app(pool.clone()).await;
    let response = post_json_auth(app, "/api/v1/stations", station_body("Borehole 1"), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Borehole 1");
    // Credentials never appear in responses.
    assert!(json["data"].get("auth_password").is_none());

    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/stations/summary", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["active"], 1);

    // Duplicate names hit the unique constraint -> 409.
    let app = common::build_test_app(pool).await;
    let response = post_json_auth(app, "/api/v1/stations", station_body("Borehole 1"), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Viewers can read stations but not create them.
#[sqlx::test(migrations = "../db/migrations")]
async fn viewer_cannot_create_station(pool: PgPool) {
    let token = login_as(&pool, "watcher", ROLE_VIEWER).await;

    let app = common::build_test_app(pool.clone()).await;
    let response = post_json_auth(app, "/api/v1/stations", station_body("Nope"), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool).await;
    let response = get_auth(app, "/api/v1/stations", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// The uptime report covers every station with a figure in [0, 100].
#[sqlx::test(migrations = "../db/migrations")]
async fn uptime_report_covers_all_stations(pool: PgPool) {
    let token = login_as(&pool, "stationadmin", ROLE_ADMIN).await;

    let app = common::build_test_app(pool.clone()).await;
    let response = post_json_auth(app, "/api/v1/stations", station_body("Borehole 2"), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool).await;
    let response = get_auth(app, "/api/v1/stations/uptime?days=3", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["window_days"], 3);
    let stations = json["data"]["stations"].as_array().unwrap();
    assert_eq!(stations.len(), 1);
    let percent = stations[0]["uptime_percent"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&percent));
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// A warning level at or above the critical level is rejected.
#[sqlx::test(migrations = "../db/migrations")]
async fn threshold_ordering_is_enforced(pool: PgPool) {
    let token = login_as(&pool, "thresholdadmin", ROLE_ADMIN).await;

    // Station + node via the API.
    let app = common::build_test_app(pool.clone()).await;
    let response = post_json_auth(app, "/api/v1/stations", station_body("Borehole 3"), &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let station_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone()).await;
    let node_body = serde_json::json!({
        "station_id": station_id,
        "node_address": "ns=2;i=42",
        "display_name": "Water level",
    });
    let response = post_json_auth(app, "/api/v1/nodes", node_body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let node_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    // warning >= critical -> 400.
    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "warning_level": 90.0, "critical_level": 80.0 });
    let response = put_json_auth(app, &format!("/api/v1/thresholds/{node_id}"), body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Correctly ordered levels are accepted.
    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({ "warning_level": 70.0, "critical_level": 90.0 });
    let response = put_json_auth(app, &format!("/api/v1/thresholds/{node_id}"), body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["warning_level"], 70.0);
    assert_eq!(json["data"]["critical_level"], 90.0);
}

// ---------------------------------------------------------------------------
// Retention policy
// ---------------------------------------------------------------------------

/// The retention policy singleton is readable and updatable; zero-day
/// retention is rejected.
#[sqlx::test(migrations = "../db/migrations")]
async fn retention_policy_roundtrip(pool: PgPool) {
    let token = login_as(&pool, "retentionadmin", ROLE_ADMIN).await;

    let app = common::build_test_app(pool.clone()).await;
    let response = get_auth(app, "/api/v1/retention-policy", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["alarm_retention_days"].as_i64().unwrap() >= 1);

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "breach_retention_days": 0 });
    let response = put_json_auth(app, "/api/v1/retention-policy", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({ "breach_retention_days": 30, "keep_unacknowledged": true });
    let response = put_json_auth(app, "/api/v1/retention-policy", body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["breach_retention_days"], 30);
    assert_eq!(json["data"]["keep_unacknowledged"], true);
}

// ---------------------------------------------------------------------------
// VPN clients
// ---------------------------------------------------------------------------

/// VPN clients are provisioned by admins and aggregated in the summary.
#[sqlx::test(migrations = "../db/migrations")]
async fn vpn_client_lifecycle(pool: PgPool) {
    let token = login_as(&pool, "vpnadmin", ROLE_ADMIN).await;

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({
        "name": "borehole-7",
        "common_name": "borehole-7.vpn",
        "assigned_ip": "10.8.0.7",
    });
    let response = post_json_auth(app, "/api/v1/vpn-clients", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "borehole-7");
    assert_eq!(json["data"]["is_connected"], false);

    let app = common::build_test_app(pool).await;
    let response = get_auth(app, "/api/v1/vpn-clients/summary", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 1);
    assert_eq!(json["data"]["connected"], 0);
}

/// Non-admins cannot see the VPN fleet.
#[sqlx::test(migrations = "../db/migrations")]
async fn vpn_routes_are_admin_only(pool: PgPool) {
    let token = login_as(&pool, "vpnviewer", ROLE_VIEWER).await;
    let app = common::build_test_app(pool).await;

    let response = get_auth(app, "/api/v1/vpn-clients", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Notification recipients
// ---------------------------------------------------------------------------

/// Recipient subscriptions validate the email address and minimum level.
#[sqlx::test(migrations = "../db/migrations")]
async fn recipient_validation(pool: PgPool) {
    let token = login_as(&pool, "notifyadmin", ROLE_ADMIN).await;

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "email": "not-an-email" });
    let response = post_json_auth(app, "/api/v1/notification-recipients", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool.clone()).await;
    let body = serde_json::json!({ "email": "ops@example.com", "min_level": "Severe" });
    let response = post_json_auth(app, "/api/v1/notification-recipients", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool).await;
    let body = serde_json::json!({
        "email": "ops@example.com",
        "name": "Operations",
        "min_level": "Critical",
    });
    let response = post_json_auth(app, "/api/v1/notification-recipients", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "ops@example.com");
    assert_eq!(json["data"]["min_level"], "Critical");
    assert_eq!(json["data"]["enabled"], true);
}

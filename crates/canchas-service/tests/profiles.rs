//! Profile and favorites integration tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestHarness;

#[tokio::test]
async fn profile_is_created_on_first_access() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/api/profile")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], harness.test_user_id.to_string());
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn profile_update_cannot_change_role() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .patch("/api/profile")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "first_name": " Ana ", "phone": "", "role": "admin" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["first_name"], "Ana");
    assert!(body["phone"].is_null());
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn favorites_round_trip() {
    let harness = TestHarness::new();
    let field = harness.seed_field("Norte", Some("Palermo")).await;
    let auth = harness.user_auth_header();

    harness
        .server
        .post("/api/favorites")
        .add_header("authorization", auth.clone())
        .json(&json!({ "field_id": field.id.to_string() }))
        .await
        .assert_status(StatusCode::CREATED);

    harness
        .server
        .post("/api/favorites")
        .add_header("authorization", auth.clone())
        .json(&json!({ "field_id": field.id.to_string() }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let favorites: Vec<serde_json::Value> = harness
        .server
        .get("/api/favorites")
        .add_header("authorization", auth.clone())
        .await
        .json();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["field"]["name"], "Norte");

    harness
        .server
        .delete(&format!("/api/favorites/{}", field.id))
        .add_header("authorization", auth.clone())
        .await
        .assert_status_ok();

    harness
        .server
        .delete(&format!("/api/favorites/{}", field.id))
        .add_header("authorization", auth)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn favorites_require_session() {
    let harness = TestHarness::new();
    harness
        .server
        .get("/api/favorites")
        .await
        .assert_status_unauthorized();
}

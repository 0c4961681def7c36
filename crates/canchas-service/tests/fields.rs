//! Field catalogue and admin management integration tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use canchas_store::Store;

use common::TestHarness;

#[tokio::test]
async fn home_fields_groups_blank_locations_under_sin_ubicacion() {
    let harness = TestHarness::new();
    harness.seed_field("Norte", Some("Palermo")).await;
    harness.seed_field("Sur", Some("Palermo")).await;
    harness.seed_field("Sin dato", None).await;
    harness.seed_field("Vacia", Some("")).await;
    let closed = harness.seed_field("Cerrada", Some("Belgrano")).await;
    harness.store.set_field_active(&closed.id, false).await.unwrap();

    let response = harness.server.get("/api/home-fields").await;

    response.assert_status_ok();
    let groups: Vec<serde_json::Value> = response.json();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["location"], "Palermo");
    assert_eq!(groups[0]["fields"].as_array().unwrap().len(), 2);
    assert_eq!(groups[1]["location"], "Sin ubicación");
    assert_eq!(groups[1]["fields"].as_array().unwrap().len(), 2);
    assert!(groups[1]["fields"][0]["images"].is_array());
}

#[tokio::test]
async fn get_field_validates_id() {
    let harness = TestHarness::new();
    let field = harness.seed_field("Norte", None).await;

    harness
        .server
        .get(&format!("/api/fields/{}", field.id))
        .await
        .assert_status_ok();
    harness
        .server
        .get("/api/fields/not-a-uuid")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    harness
        .server
        .get(&format!("/api/fields/{}", canchas_core::FieldId::generate()))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn admin_endpoints_require_admin_role() {
    let harness = TestHarness::new();

    harness
        .server
        .get("/api/admin/fields")
        .await
        .assert_status_unauthorized();

    harness
        .server
        .get("/api/admin/fields")
        .add_header("authorization", "Bearer not-a-jwt".to_string())
        .await
        .assert_status_unauthorized();

    harness
        .server
        .get("/api/admin/fields")
        .add_header("authorization", harness.user_auth_header())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    harness
        .server
        .post("/api/paddle/create-checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "statementId": canchas_core::StatementId::generate().to_string() }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let admin = harness.admin_auth_header().await;
    harness
        .server
        .get("/api/admin/fields")
        .add_header("authorization", admin)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let harness = TestHarness::new();
    let claims = canchas_service::auth::JwtClaims {
        sub: harness.test_user_id.to_string(),
        aud: Some(json!("authenticated")),
        exp: chrono::Utc::now().timestamp() + 3600,
        email: None,
    };
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    harness
        .server
        .get("/api/profile")
        .add_header("authorization", format!("Bearer {forged}"))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn admin_creates_and_deactivates_field() {
    let harness = TestHarness::new();
    let admin = harness.admin_auth_header().await;

    let response = harness
        .server
        .post("/api/admin/fields")
        .add_header("authorization", admin.clone())
        .json(&json!({
            "name": "Cancha Nueva",
            "location": "Caballito",
            "price_per_hour_cents": 15000,
            "owner_email": "duenio@example.com",
            "images": ["https://img.example.com/1.jpg"]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["active"], true);
    assert_eq!(created["owner_email"], "duenio@example.com");

    let response = harness
        .server
        .patch(&format!("/api/admin/fields/{id}"))
        .add_header("authorization", admin)
        .json(&json!({ "active": false, "location": "" }))
        .await;

    response.assert_status_ok();
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["active"], false);
    assert!(updated["location"].is_null());

    let listed: Vec<serde_json::Value> = harness.server.get("/api/fields").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn admin_rejects_invalid_field() {
    let harness = TestHarness::new();
    let admin = harness.admin_auth_header().await;

    harness
        .server
        .post("/api/admin/fields")
        .add_header("authorization", admin)
        .json(&json!({ "name": " ", "price_per_hour_cents": 100 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_calendar_filters_by_date_range() {
    let harness = TestHarness::new();
    let field = harness.seed_field("Norte", None).await;
    for date in ["2026-10-19", "2026-10-20", "2026-10-21"] {
        harness
            .server
            .post("/functions/v1/create-booking")
            .json(&json!({
                "email": "ana@example.com",
                "field_id": field.id.to_string(),
                "date": date,
                "hour": 18
            }))
            .await
            .assert_status_ok();
    }
    let admin = harness.admin_auth_header().await;

    let response = harness
        .server
        .get("/api/admin/bookings")
        .add_query_param("from", "2026-10-20")
        .add_query_param("to", "2026-10-21")
        .add_query_param("field_id", field.id.to_string())
        .add_header("authorization", admin)
        .await;

    response.assert_status_ok();
    let bookings: Vec<serde_json::Value> = response.json();
    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0]["date"], "2026-10-20");
}

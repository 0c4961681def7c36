//! Scheduled job endpoint integration tests.

mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use canchas_core::{BillingPeriod, MonthlyStatement, StatementStatus};
use canchas_store::Store;

use common::{TestHarness, SERVICE_API_KEY};

#[tokio::test]
async fn overdue_sweep_requires_service_key() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/internal/jobs/overdue-sweep")
        .await
        .assert_status_unauthorized();

    harness
        .server
        .post("/internal/jobs/overdue-sweep")
        .add_header("x-api-key", "wrong".to_string())
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn overdue_sweep_deactivates_late_fields_only() {
    let harness = TestHarness::new();
    let now = Utc::now();
    let late = harness.seed_field("Tarde", None).await;
    let fine = harness.seed_field("Al dia", None).await;

    let mut late_statement =
        MonthlyStatement::issue(late.id, BillingPeriod::new(8, 2026).unwrap(), 3, 500, 10);
    late_statement.due_date = now - Duration::days(6);
    harness.store.insert_statement(&late_statement).await.unwrap();

    let mut fine_statement =
        MonthlyStatement::issue(fine.id, BillingPeriod::new(8, 2026).unwrap(), 3, 500, 10);
    fine_statement.due_date = now - Duration::days(4);
    harness.store.insert_statement(&fine_statement).await.unwrap();

    let response = harness
        .server
        .post("/internal/jobs/overdue-sweep")
        .add_header("x-api-key", SERVICE_API_KEY.to_string())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["overdue"], json!([late_statement.id.to_string()]));

    let stored = harness.store.get_statement(&late_statement.id).await.unwrap().unwrap();
    assert_eq!(stored.status, StatementStatus::Overdue);
    assert!(!harness.store.get_field(&late.id).await.unwrap().unwrap().active);
    assert!(harness.store.get_field(&fine.id).await.unwrap().unwrap().active);
}

#[tokio::test]
async fn monthly_statements_job_issues_statements() {
    let harness = TestHarness::with_config(|c| c.commission_per_booking_cents = 250);
    let field = harness.seed_field("Norte", None).await;
    for hour in [18, 19] {
        harness
            .server
            .post("/functions/v1/create-booking")
            .json(&json!({
                "email": "ana@example.com",
                "field_id": field.id.to_string(),
                "date": "2026-09-12",
                "hour": hour
            }))
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .post("/internal/jobs/monthly-statements")
        .add_header("x-api-key", SERVICE_API_KEY.to_string())
        .json(&json!({ "month": 9, "year": 2026 }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["created"].as_array().unwrap().len(), 1);

    let statement = harness
        .store
        .find_statement_for_period(&field.id, BillingPeriod::new(9, 2026).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(statement.reservations_count, 2);
    assert_eq!(statement.amount_due_cents, 500);
    assert_eq!(statement.status, StatementStatus::Pending);
}

#[tokio::test]
async fn admin_can_generate_statements() {
    let harness = TestHarness::new();
    let admin = harness.admin_auth_header().await;

    let response = harness
        .server
        .post("/api/admin/statements/generate")
        .add_header("authorization", admin.clone())
        .json(&json!({ "month": 13, "year": 2026 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    harness
        .server
        .post("/api/admin/statements/generate")
        .add_header("authorization", admin)
        .json(&json!({ "month": 9, "year": 2026 }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn monthly_statements_rejects_malformed_period() {
    let harness = TestHarness::new();

    for body in [r#"{"month":"9","year":2026}"#, r#"{"year":2026}"#, "septiembre"] {
        harness
            .server
            .post("/internal/jobs/monthly-statements")
            .add_header("x-api-key", SERVICE_API_KEY.to_string())
            .text(body)
            .await
            .assert_status(axum::http::StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn monthly_statements_without_body_bills_previous_month() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/internal/jobs/monthly-statements")
        .add_header("x-api-key", SERVICE_API_KEY.to_string())
        .await;

    response.assert_status_ok();
    let expected = BillingPeriod::previous(Utc::now().date_naive());
    let body: serde_json::Value = response.json();
    assert_eq!(body["month"], expected.month);
    assert_eq!(body["year"], expected.year);
}

//! Paddle webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use canchas_core::{is_past_grace, MonthlyStatement, StatementId, StatementStatus};
use canchas_store::StatementFilter;

use crate::crypto::verify_paddle_signature;
use crate::error::ApiError;
use crate::handlers::OkResponse;
use crate::paddle::{Transaction, WebhookEvent};
use crate::state::AppState;

/// Handle Paddle webhooks.
///
/// The signature is checked against the raw body before anything is parsed.
/// Unknown events and statements are acknowledged so Paddle stops retrying.
pub async fn paddle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<OkResponse>, ApiError> {
    let Some(secret) = state.config.paddle_webhook_secret.as_deref() else {
        tracing::warn!("Paddle webhook received but no webhook secret is configured");
        return Err(ApiError::Unauthorized);
    };

    let signature = headers
        .get("paddle-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Paddle webhook without signature header");
            ApiError::Unauthorized
        })?;

    verify_paddle_signature(
        secret,
        signature,
        &body,
        state.config.paddle_webhook_tolerance_seconds,
        Utc::now().timestamp(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Invalid Paddle webhook signature");
        ApiError::Unauthorized
    })?;

    let event: WebhookEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = ?event.event_id,
        "Received Paddle webhook"
    );

    match event.event_type.as_str() {
        "transaction.completed" => {
            let transaction = parse_transaction(event.data)?;
            handle_transaction_completed(&state, &transaction).await?;
        }
        "transaction.payment_failed" => {
            let transaction = parse_transaction(event.data)?;
            handle_payment_failed(&state, &transaction).await?;
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Unhandled Paddle event");
        }
    }

    Ok(Json(OkResponse::OK))
}

fn parse_transaction(data: serde_json::Value) -> Result<Transaction, ApiError> {
    serde_json::from_value(data)
        .map_err(|e| ApiError::BadRequest(format!("invalid transaction payload: {e}")))
}

/// Find the statement a transaction pays for, if it names a known one.
async fn find_statement(
    state: &AppState,
    transaction: &Transaction,
) -> Result<Option<MonthlyStatement>, ApiError> {
    let Some(raw_id) = transaction.statement_id() else {
        tracing::warn!(transaction_id = %transaction.id, "Transaction without statement_id");
        return Ok(None);
    };

    let Ok(statement_id) = raw_id.parse::<StatementId>() else {
        tracing::warn!(transaction_id = %transaction.id, statement_id = %raw_id, "Malformed statement_id");
        return Ok(None);
    };

    let statement = state.store.get_statement(&statement_id).await?;
    if statement.is_none() {
        tracing::warn!(transaction_id = %transaction.id, statement_id = %statement_id, "Unknown statement");
    }
    Ok(statement)
}

async fn handle_transaction_completed(
    state: &AppState,
    transaction: &Transaction,
) -> Result<(), ApiError> {
    let Some(mut statement) = find_statement(state, transaction).await? else {
        return Ok(());
    };

    if statement.status == StatementStatus::Paid {
        tracing::info!(statement_id = %statement.id, "Statement already paid - ignoring");
        return Ok(());
    }

    let previous = statement.status;
    let paid_at = Utc::now();
    statement.mark_paid(
        transaction.id.clone(),
        transaction.payment_method().map(str::to_string),
        paid_at,
    )?;
    state.store.update_statement(&statement, previous).await?;

    tracing::info!(
        statement_id = %statement.id,
        transaction_id = %transaction.id,
        payment_method = ?statement.payment_method,
        "Statement paid"
    );

    // Late statements are usually paid through a checkout, so by now they
    // read `processing` rather than `overdue`.
    if previous == StatementStatus::Overdue || is_past_grace(statement.due_date, paid_at) {
        reactivate_if_settled(state, &statement).await?;
    }

    Ok(())
}

/// Reactivate a deactivated field once none of its statements are overdue.
async fn reactivate_if_settled(state: &AppState, paid: &MonthlyStatement) -> Result<(), ApiError> {
    let Some(field) = state.store.get_field(&paid.field_id).await? else {
        return Ok(());
    };
    if field.active {
        return Ok(());
    }

    let still_overdue = state
        .store
        .list_statements(&StatementFilter {
            field_id: Some(paid.field_id),
            status: Some(StatementStatus::Overdue),
        })
        .await?;

    if still_overdue.is_empty() {
        state.store.set_field_active(&paid.field_id, true).await?;
        tracing::info!(field_id = %paid.field_id, "Overdue settled - field reactivated");
    } else {
        tracing::info!(
            field_id = %paid.field_id,
            overdue = still_overdue.len(),
            "Field stays inactive - statements still overdue"
        );
    }
    Ok(())
}

async fn handle_payment_failed(
    state: &AppState,
    transaction: &Transaction,
) -> Result<(), ApiError> {
    let Some(mut statement) = find_statement(state, transaction).await? else {
        return Ok(());
    };

    if statement.status != StatementStatus::Processing {
        tracing::info!(
            statement_id = %statement.id,
            status = %statement.status,
            "Payment failure for statement not in checkout - ignoring"
        );
        return Ok(());
    }

    statement.mark_failed()?;
    state
        .store
        .update_statement(&statement, StatementStatus::Processing)
        .await?;

    tracing::warn!(
        statement_id = %statement.id,
        transaction_id = %transaction.id,
        "Statement payment failed"
    );
    Ok(())
}

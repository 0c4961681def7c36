//! Commission statement handlers: checkout creation and admin listing.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use canchas_core::{FieldId, MonthlyStatement, StatementId, StatementStatus};
use canchas_store::StatementFilter;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::handlers::jobs::PeriodRequest;
use crate::jobs::{self, GenerationReport};
use crate::state::AppState;

/// Request to pay a statement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    /// Statement to pay.
    pub statement_id: String,
}

/// Checkout issued for a statement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Paddle transaction ID.
    pub transaction_id: String,
}

/// Create a Paddle checkout for a statement and move it to `processing`.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, ApiError> {
    let statement_id: StatementId = request
        .statement_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid statementId: {}", request.statement_id)))?;

    let mut statement = state
        .store
        .get_statement(&statement_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("statement not found: {statement_id}")))?;

    if !statement.status.can_transition_to(StatementStatus::Processing) {
        return Err(ApiError::Conflict(format!(
            "statement is {} and cannot be paid",
            statement.status
        )));
    }

    let paddle = state
        .paddle
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Paddle not configured".into()))?;

    let field_name = state
        .store
        .get_field(&statement.field_id)
        .await?
        .map_or_else(|| "Cancha".to_string(), |f| f.name);

    let return_url = format!(
        "{}/admin/pagos",
        state.config.public_app_url.trim_end_matches('/')
    );

    let checkout = paddle
        .create_statement_checkout(
            &statement,
            &field_name,
            &state.config.paddle_currency,
            &return_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, statement_id = %statement_id, "Failed to create Paddle transaction");
            ApiError::ExternalService("Failed to create checkout".into())
        })?;

    let previous = statement.status;
    statement.begin_checkout(checkout.transaction_id.clone())?;
    state
        .store
        .update_statement(&statement, previous)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, statement_id = %statement_id, "Statement changed during checkout");
            ApiError::from(e)
        })?;

    tracing::info!(
        statement_id = %statement_id,
        transaction_id = %checkout.transaction_id,
        admin_id = %admin.user.user_id,
        "Statement checkout created"
    );

    Ok(Json(CreateCheckoutResponse {
        checkout_url: checkout.checkout_url,
        transaction_id: checkout.transaction_id,
    }))
}

/// Statement listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct StatementsQuery {
    /// Only this status.
    pub status: Option<String>,
    /// Only this field.
    pub field_id: Option<String>,
}

/// List statements, newest period first.
pub async fn admin_list_statements(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Query(query): Query<StatementsQuery>,
) -> Result<Json<Vec<MonthlyStatement>>, ApiError> {
    let filter = StatementFilter {
        field_id: query
            .field_id
            .map(|id| {
                id.parse::<FieldId>()
                    .map_err(|_| ApiError::BadRequest(format!("invalid field id: {id}")))
            })
            .transpose()?,
        status: query
            .status
            .map(|s| s.parse::<StatementStatus>().map_err(ApiError::BadRequest))
            .transpose()?,
    };

    Ok(Json(state.store.list_statements(&filter).await?))
}

/// Issue statements for a month from the admin panel.
pub async fn admin_generate_statements(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(request): Json<PeriodRequest>,
) -> Result<Json<GenerationReport>, ApiError> {
    let period = PeriodRequest::resolve(Some(request))?;
    tracing::info!(
        admin_id = %admin.user.user_id,
        month = period.month,
        year = period.year,
        "Statement generation requested"
    );

    let report = jobs::generate_statements(
        state.store.as_ref(),
        period,
        state.config.commission_per_booking_cents,
        state.config.statement_due_days,
    )
    .await?;
    Ok(Json(report))
}

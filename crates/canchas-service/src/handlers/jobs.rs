//! Job endpoints for an external scheduler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use canchas_core::BillingPeriod;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::jobs::{self, GenerationReport, SweepReport};
use crate::state::AppState;

/// Run the overdue sweep now.
pub async fn overdue_sweep(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
) -> Result<Json<SweepReport>, ApiError> {
    tracing::info!(service = %service.service_name, "Overdue sweep triggered");
    let report = jobs::run_overdue_sweep(state.store.as_ref(), Utc::now()).await?;
    Ok(Json(report))
}

/// Billing period to generate. Defaults to the previous calendar month.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeriodRequest {
    /// Month, 1-12.
    pub month: u32,
    /// Year.
    pub year: i32,
}

impl PeriodRequest {
    /// Parse an optional request body. Only an empty body means "no period".
    pub fn from_body(body: &[u8]) -> Result<Option<Self>, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| ApiError::BadRequest(format!("invalid period: {e}")))
    }

    /// Resolve to a validated period.
    pub fn resolve(request: Option<Self>) -> Result<BillingPeriod, ApiError> {
        match request {
            Some(p) => Ok(BillingPeriod::new(p.month, p.year)?),
            None => Ok(BillingPeriod::previous(Utc::now().date_naive())),
        }
    }
}

/// Issue statements for a month, the previous one when the body is empty.
pub async fn monthly_statements(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
    body: Bytes,
) -> Result<Json<GenerationReport>, ApiError> {
    let period = PeriodRequest::resolve(PeriodRequest::from_body(&body)?)?;
    tracing::info!(
        service = %service.service_name,
        month = period.month,
        year = period.year,
        "Statement generation triggered"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_means_no_period() {
        assert!(PeriodRequest::from_body(b"").unwrap().is_none());
        assert!(PeriodRequest::from_body(b" \n").unwrap().is_none());
    }

    #[test]
    fn malformed_body_is_rejected() {
        for body in [
            &br#"{"month":"9","year":2026}"#[..],
            br#"{"month":9}"#,
            b"not json",
        ] {
            assert!(matches!(
                PeriodRequest::from_body(body),
                Err(ApiError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn explicit_period_is_validated() {
        let request = PeriodRequest::from_body(br#"{"month":13,"year":2026}"#).unwrap();
        assert!(PeriodRequest::resolve(request).is_err());

        let request = PeriodRequest::from_body(br#"{"month":9,"year":2026}"#).unwrap();
        let period = PeriodRequest::resolve(request).unwrap();
        assert_eq!((period.month, period.year), (9, 2026));
    }
}

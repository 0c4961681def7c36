//! Booking confirmation email endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use canchas_core::format_hour;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::bookings::HourInput;
use crate::handlers::OkResponse;
use crate::mail::templates::{self, BookingDetails};
use crate::state::AppState;

/// Request to (re)send a booking confirmation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBookingEmailRequest {
    /// Recipient.
    pub email: String,
    /// Field display name.
    pub field_name: String,
    /// Booked day.
    pub date: String,
    /// Booked hour.
    pub hour: HourInput,
}

/// Send a booking confirmation to the given address.
///
/// Unlike the notifications fired by the reservation flow, a delivery failure
/// here is reported to the caller.
pub async fn send_booking_email(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<SendBookingEmailRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    if request.email.trim().is_empty()
        || request.field_name.trim().is_empty()
        || request.date.trim().is_empty()
    {
        return Err(ApiError::BadRequest("email, fieldName and date are required".into()));
    }

    let hour = format_hour(request.hour.parse()?);
    let email = templates::customer_confirmation(&BookingDetails {
        field_name: request.field_name.trim(),
        date: request.date.trim(),
        hour: &hour,
        customer_email: request.email.trim(),
    });

    state.mailer.send(&email).await.map_err(|e| {
        tracing::error!(error = %e, to = %email.to, "Failed to send booking email");
        ApiError::ExternalService("Failed to send email".into())
    })?;

    tracing::info!(to = %email.to, requested_by = %user.user_id, "Booking email sent");

    Ok(Json(OkResponse::OK))
}

//! Booking handlers.
//!
//! `POST /functions/v1/create-booking` is the reservation flow. It validates
//! the request, checks the field and the slot, inserts the booking and then
//! notifies the customer, the platform admin and the field owner. Emails are
//! best effort: a failed notification is logged and never fails the booking.
//!
//! The slot check is advisory. The store enforces one active booking per
//! slot on insert, so two concurrent requests for the same hour cannot both
//! succeed.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use canchas_core::{
    format_hour, parse_date, parse_hour, Booking, BookingId, BookingStatus, Field, FieldId, Slot,
    DATE_FORMAT,
};
use canchas_store::BookingFilter;

use crate::auth::{AdminAuth, AuthUser};
use crate::error::{ApiError, FunctionError, FIELD_UNAVAILABLE, SLOT_UNAVAILABLE};
use crate::handlers::OkResponse;
use crate::mail::templates::{self, BookingDetails};
use crate::mail::Email;
use crate::state::AppState;

/// An hour given either as a number (`18`) or a string (`"18"`, `"18:00"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HourInput {
    /// Numeric hour.
    Number(i64),
    /// Textual hour.
    Text(String),
}

impl HourInput {
    /// Parse into an hour of day.
    pub fn parse(&self) -> Result<u8, ApiError> {
        match self {
            Self::Number(n) => u8::try_from(*n)
                .ok()
                .filter(|h| *h <= 23)
                .ok_or_else(|| ApiError::BadRequest(format!("invalid hour: {n}"))),
            Self::Text(s) => Ok(parse_hour(s)?),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

/// Raw reservation request. Every field is optional so that missing values
/// are reported as a 400 in the function's own error shape.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingRequest {
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Field to book.
    #[serde(default)]
    pub field_id: Option<String>,
    /// Day (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: Option<String>,
    /// Hour of day.
    #[serde(default)]
    pub hour: Option<HourInput>,
}

/// A validated reservation.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    /// Customer email, trimmed.
    pub email: String,
    /// Requested slot.
    pub slot: Slot,
}

impl CreateBookingRequest {
    /// Check presence and shape of every value.
    pub fn validate(self) -> Result<BookingRequest, ApiError> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let (Some(email), Some(field_id), Some(date), Some(hour)) = (
            non_blank(self.email),
            non_blank(self.field_id),
            non_blank(self.date),
            self.hour.filter(|h| !h.is_blank()),
        ) else {
            return Err(ApiError::BadRequest("Faltan datos de la reserva".into()));
        };

        let email = email.trim().to_string();
        if !email.contains('@') {
            return Err(ApiError::BadRequest(format!("invalid email: {email}")));
        }

        let field_id: FieldId = field_id
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("invalid field id: {field_id}")))?;
        let slot = Slot::new(field_id, parse_date(&date)?, hour.parse()?)?;

        Ok(BookingRequest { email, slot })
    }
}

/// Successful reservation.
#[derive(Debug, Serialize)]
pub struct CreateBookingResponse {
    /// Always `true`.
    pub ok: bool,
    /// The new booking.
    pub booking_id: BookingId,
}

/// Reserve a slot.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<Json<CreateBookingResponse>, FunctionError> {
    let Json(request) =
        payload.map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;
    let request = request.validate()?;

    let (field, booking) = reserve_slot(&state, &request).await?;
    notify_booking(&state, &field, &booking).await;

    Ok(Json(CreateBookingResponse {
        ok: true,
        booking_id: booking.id,
    }))
}

/// Check the field and the slot, then insert an active booking.
///
/// # Errors
///
/// - `NotFound` if the field doesn't exist
/// - `Conflict("Cancha no disponible")` if the field is inactive
/// - `Conflict("Horario no disponible")` if the slot has an active booking,
///   including one inserted concurrently after the check
pub async fn reserve_slot(
    state: &AppState,
    request: &BookingRequest,
) -> Result<(Field, Booking), ApiError> {
    let slot = request.slot;

    let field = state
        .store
        .get_field(&slot.field_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("field not found: {}", slot.field_id)))?;

    if !field.active {
        return Err(ApiError::Conflict(FIELD_UNAVAILABLE.into()));
    }

    if state.store.find_active_booking(&slot).await?.is_some() {
        return Err(ApiError::Conflict(SLOT_UNAVAILABLE.into()));
    }

    let booking = Booking::new(slot, request.email.clone());
    state.store.insert_booking(&booking).await?;

    tracing::info!(
        booking_id = %booking.id,
        field_id = %field.id,
        date = %booking.date,
        hour = booking.hour,
        "Booking created"
    );

    Ok((field, booking))
}

/// Send the three booking notifications concurrently. Never fails.
pub async fn notify_booking(state: &AppState, field: &Field, booking: &Booking) {
    let date = booking.date.format(DATE_FORMAT).to_string();
    let hour = format_hour(booking.hour);
    let details = BookingDetails {
        field_name: &field.name,
        date: &date,
        hour: &hour,
        customer_email: &booking.email,
    };

    let customer = templates::customer_confirmation(&details);
    let admin = state
        .config
        .admin_email
        .as_deref()
        .map(|to| templates::admin_notice(to, &details));
    let owner = field
        .owner_email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(|to| templates::owner_notice(to, &details));

    futures::join!(
        send_logged(state, Some(customer), "customer"),
        send_logged(state, admin, "admin"),
        send_logged(state, owner, "owner"),
    );
}

async fn send_logged(state: &AppState, email: Option<Email>, recipient: &'static str) {
    let Some(email) = email else {
        tracing::debug!(recipient, "No address configured - notification skipped");
        return;
    };
    if let Err(e) = state.mailer.send(&email).await {
        tracing::warn!(error = %e, recipient, to = %email.to, "Booking notification failed");
    }
}

// =============================================================================
// Session endpoints
// =============================================================================

/// Bookings made with the session's email, soonest first.
pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let email = user.require_email()?;
    let bookings = state
        .store
        .list_bookings(&BookingFilter {
            email: Some(email.to_string()),
            ..BookingFilter::default()
        })
        .await?;
    Ok(Json(bookings))
}

/// Cancel a booking. Allowed for the customer who made it and for admins.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let id: BookingId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid booking id: {id}")))?;
    let booking = state
        .store
        .get_booking(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("booking not found: {id}")))?;

    let is_owner = user.email.as_deref().is_some_and(|e| booking.belongs_to(e));
    if !is_owner {
        let is_admin = state
            .store
            .get_profile(&user.user_id)
            .await?
            .is_some_and(|p| p.is_admin());
        if !is_admin {
            return Err(ApiError::Forbidden);
        }
    }

    if booking.status == BookingStatus::Cancelled {
        return Err(ApiError::Conflict("booking already cancelled".into()));
    }

    state.store.cancel_booking(&id).await?;
    tracing::info!(booking_id = %id, user_id = %user.user_id, "Booking cancelled");

    Ok(Json(OkResponse::OK))
}

// =============================================================================
// Admin
// =============================================================================

/// Calendar query for admins. Dates are inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct AdminBookingsQuery {
    /// Earliest day (`YYYY-MM-DD`).
    pub from: Option<String>,
    /// Latest day (`YYYY-MM-DD`).
    pub to: Option<String>,
    /// Only this field.
    pub field_id: Option<String>,
    /// Only this status (`active`, `cancelled`).
    pub status: Option<String>,
}

/// Bookings for the admin calendar.
pub async fn admin_list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Query(query): Query<AdminBookingsQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let parse_opt_date = |raw: Option<String>| -> Result<Option<NaiveDate>, ApiError> {
        raw.map(|d| parse_date(&d)).transpose().map_err(ApiError::from)
    };

    let filter = BookingFilter {
        field_id: query
            .field_id
            .map(|id| {
                id.parse::<FieldId>()
                    .map_err(|_| ApiError::BadRequest(format!("invalid field id: {id}")))
            })
            .transpose()?,
        email: None,
        from: parse_opt_date(query.from)?,
        to: parse_opt_date(query.to)?,
        status: query
            .status
            .map(|s| s.parse::<BookingStatus>().map_err(ApiError::BadRequest))
            .transpose()?,
    };

    Ok(Json(state.store.list_bookings(&filter).await?))
}

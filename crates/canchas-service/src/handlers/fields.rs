//! Field handlers: public catalogue, availability and admin management.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use canchas_core::{
    format_hour, parse_date, BookingStatus, Field, FieldId, FieldUpdate, UNKNOWN_LOCATION,
};
use canchas_store::BookingFilter;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Public view of a field.
#[derive(Debug, Serialize)]
pub struct FieldResponse {
    /// Field ID.
    pub id: FieldId,
    /// Display name.
    pub name: String,
    /// Location, if set.
    pub location: Option<String>,
    /// Hourly price in cents.
    pub price_per_hour_cents: i64,
    /// Whether the field takes bookings.
    pub active: bool,
    /// Image URLs.
    pub images: Vec<String>,
}

impl From<Field> for FieldResponse {
    fn from(field: Field) -> Self {
        Self {
            id: field.id,
            name: field.name,
            location: field.location,
            price_per_hour_cents: field.price_per_hour_cents,
            active: field.active,
            images: field.images,
        }
    }
}

/// Fields sharing a location.
#[derive(Debug, Serialize)]
pub struct LocationGroup {
    /// Location name, or `"Sin ubicación"`.
    pub location: String,
    /// Active fields at that location.
    pub fields: Vec<FieldResponse>,
}

/// Active fields grouped by location for the home page.
///
/// Groups are sorted by name with `"Sin ubicación"` last.
pub async fn home_fields(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationGroup>>, ApiError> {
    let fields = state.store.list_fields(true).await?;
    Ok(Json(group_by_location(fields)))
}

fn group_by_location(fields: Vec<Field>) -> Vec<LocationGroup> {
    let mut groups: BTreeMap<String, Vec<FieldResponse>> = BTreeMap::new();
    for field in fields {
        let bucket = field.location_bucket().to_string();
        groups.entry(bucket).or_default().push(field.into());
    }

    let unknown = groups.remove(UNKNOWN_LOCATION);
    groups
        .into_iter()
        .chain(unknown.map(|f| (UNKNOWN_LOCATION.to_string(), f)))
        .map(|(location, fields)| LocationGroup { location, fields })
        .collect()
}

/// List active fields.
pub async fn list_fields(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FieldResponse>>, ApiError> {
    let fields = state.store.list_fields(true).await?;
    Ok(Json(fields.into_iter().map(FieldResponse::from).collect()))
}

/// Get a field.
pub async fn get_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FieldResponse>, ApiError> {
    let field = load_field(&state, &id).await?;
    Ok(Json(field.into()))
}

/// Query for the availability endpoint.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Day to inspect (`YYYY-MM-DD`).
    pub date: String,
}

/// One bookable hour.
#[derive(Debug, Serialize)]
pub struct HourAvailability {
    /// Hour of day, 0-23.
    pub hour: u8,
    /// Display label (`HH:00`).
    pub label: String,
    /// Whether the hour is free.
    pub available: bool,
}

/// Availability of a field on a day.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Field ID.
    pub field_id: FieldId,
    /// Requested day.
    pub date: NaiveDate,
    /// Every bookable hour in order.
    pub hours: Vec<HourAvailability>,
}

/// Free and taken hours of a field on one day.
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let field = load_field(&state, &id).await?;
    let date = parse_date(&query.date)?;

    let taken: Vec<u8> = state
        .store
        .list_bookings(&BookingFilter {
            field_id: Some(field.id),
            from: Some(date),
            to: Some(date),
            status: Some(BookingStatus::Active),
            ..BookingFilter::default()
        })
        .await?
        .into_iter()
        .map(|b| b.hour)
        .collect();

    let hours = state
        .config
        .bookable_hours()
        .map(|hour| HourAvailability {
            hour,
            label: format_hour(hour),
            available: field.active && !taken.contains(&hour),
        })
        .collect();

    Ok(Json(AvailabilityResponse {
        field_id: field.id,
        date,
        hours,
    }))
}

// =============================================================================
// Admin
// =============================================================================

/// Admin view of a field.
#[derive(Debug, Serialize)]
pub struct AdminFieldResponse {
    /// Field ID.
    pub id: FieldId,
    /// Display name.
    pub name: String,
    /// Location, if set.
    pub location: Option<String>,
    /// Hourly price in cents.
    pub price_per_hour_cents: i64,
    /// Whether the field takes bookings.
    pub active: bool,
    /// Owner contact.
    pub owner_email: Option<String>,
    /// Image URLs.
    pub images: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<Field> for AdminFieldResponse {
    fn from(field: Field) -> Self {
        Self {
            id: field.id,
            name: field.name,
            location: field.location,
            price_per_hour_cents: field.price_per_hour_cents,
            active: field.active,
            owner_email: field.owner_email,
            images: field.images,
            created_at: field.created_at,
            updated_at: field.updated_at,
        }
    }
}

/// List every field, active or not.
pub async fn admin_list_fields(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
) -> Result<Json<Vec<AdminFieldResponse>>, ApiError> {
    let fields = state.store.list_fields(false).await?;
    Ok(Json(fields.into_iter().map(AdminFieldResponse::from).collect()))
}

/// Request to create a field.
#[derive(Debug, Deserialize)]
pub struct CreateFieldRequest {
    /// Display name.
    pub name: String,
    /// Location.
    #[serde(default)]
    pub location: Option<String>,
    /// Hourly price in cents.
    pub price_per_hour_cents: i64,
    /// Owner contact.
    #[serde(default)]
    pub owner_email: Option<String>,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Whether the field takes bookings (default: true).
    #[serde(default)]
    pub active: Option<bool>,
}

/// Create a field.
pub async fn admin_create_field(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(request): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<AdminFieldResponse>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }
    if request.price_per_hour_cents < 0 {
        return Err(ApiError::BadRequest("price must not be negative".into()));
    }

    let mut field = Field::new(request.name.trim(), request.price_per_hour_cents);
    field.apply(FieldUpdate {
        location: request.location,
        owner_email: request.owner_email,
        images: Some(request.images),
        active: request.active,
        ..FieldUpdate::default()
    });

    state.store.put_field(&field).await?;

    tracing::info!(field_id = %field.id, admin_id = %admin.user.user_id, "Field created");

    Ok((StatusCode::CREATED, Json(field.into())))
}

/// Update a field. Empty `location` or `owner_email` clears them.
pub async fn admin_update_field(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(id): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<AdminFieldResponse>, ApiError> {
    if update.price_per_hour_cents.is_some_and(|p| p < 0) {
        return Err(ApiError::BadRequest("price must not be negative".into()));
    }
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }

    let mut field = load_field(&state, &id).await?;
    field.apply(update);
    state.store.put_field(&field).await?;

    tracing::info!(
        field_id = %field.id,
        active = field.active,
        admin_id = %admin.user.user_id,
        "Field updated"
    );

    Ok(Json(field.into()))
}

/// Parse a field ID and load it, or 404.
pub(crate) async fn load_field(state: &AppState, raw_id: &str) -> Result<Field, ApiError> {
    let id: FieldId = raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid field id: {raw_id}")))?;
    state
        .store
        .get_field(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("field not found: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, location: Option<&str>) -> Field {
        let mut f = Field::new(name, 10_000);
        f.location = location.map(str::to_string);
        f
    }

    #[test]
    fn unknown_location_group_is_last() {
        let groups = group_by_location(vec![
            field("A", None),
            field("B", Some("Palermo")),
            field("C", Some("  ")),
            field("D", Some("Belgrano")),
        ]);

        let names: Vec<&str> = groups.iter().map(|g| g.location.as_str()).collect();
        assert_eq!(names, vec!["Belgrano", "Palermo", UNKNOWN_LOCATION]);
        assert_eq!(groups[2].fields.len(), 2);
    }
}

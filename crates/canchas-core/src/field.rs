//! Sports fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::FieldId;

/// Bucket name for fields without a usable location.
pub const UNKNOWN_LOCATION: &str = "Sin ubicación";

/// A reservable sports field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field ID.
    pub id: FieldId,

    /// Display name.
    pub name: String,

    /// Free-form location (neighbourhood, city). May be missing.
    pub location: Option<String>,

    /// Hourly price in minor currency units.
    pub price_per_hour_cents: i64,

    /// Whether the field can be booked. Cleared when its statement goes overdue.
    pub active: bool,

    /// Owner contact, notified on every new booking.
    pub owner_email: Option<String>,

    /// Public image URLs.
    pub images: Vec<String>,

    /// When the field was created.
    pub created_at: DateTime<Utc>,

    /// When the field was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Field {
    /// Create a new active field.
    #[must_use]
    pub fn new(name: impl Into<String>, price_per_hour_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: FieldId::generate(),
            name: name.into(),
            location: None,
            price_per_hour_cents,
            active: true,
            owner_email: None,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The location bucket this field is listed under.
    #[must_use]
    pub fn location_bucket(&self) -> &str {
        location_bucket(self.location.as_deref())
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: FieldUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(location) = update.location {
            self.location = Some(location).filter(|l| !l.trim().is_empty());
        }
        if let Some(price) = update.price_per_hour_cents {
            self.price_per_hour_cents = price;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        if let Some(owner_email) = update.owner_email {
            self.owner_email = Some(owner_email).filter(|e| !e.trim().is_empty());
        }
        if let Some(images) = update.images {
            self.images = images;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial field update. `None` leaves the value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldUpdate {
    /// New name.
    pub name: Option<String>,
    /// New location; an empty string clears it.
    pub location: Option<String>,
    /// New hourly price.
    pub price_per_hour_cents: Option<i64>,
    /// New active flag.
    pub active: Option<bool>,
    /// New owner email; an empty string clears it.
    pub owner_email: Option<String>,
    /// Replacement image list.
    pub images: Option<Vec<String>>,
}

/// Map a raw location to its listing bucket.
///
/// Missing or blank locations fall into [`UNKNOWN_LOCATION`].
#[must_use]
pub fn location_bucket(location: Option<&str>) -> &str {
    match location.map(str::trim) {
        Some(l) if !l.is_empty() => l,
        _ => UNKNOWN_LOCATION,
    }
}

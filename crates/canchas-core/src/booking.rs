//! Bookings and slots.
//!
//! A slot is one reservable hour of one field on one date. At most one
//! `Active` booking may occupy a slot; cancelled bookings free it again.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{BookingId, FieldId};

/// Date format used on the wire (`YYYY-MM-DD`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One reservable hour: `(field, date, hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Field being reserved.
    pub field_id: FieldId,
    /// Calendar date.
    pub date: NaiveDate,
    /// Starting hour, `0..=23`.
    pub hour: u8,
}

impl Slot {
    /// Create a slot, validating the hour.
    pub fn new(field_id: FieldId, date: NaiveDate, hour: u8) -> Result<Self> {
        if hour > 23 {
            return Err(CoreError::InvalidHour(hour.to_string()));
        }
        Ok(Self {
            field_id,
            date,
            hour,
        })
    }
}

/// Booking status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Occupies its slot.
    Active,
    /// Released; does not occupy its slot.
    Cancelled,
}

impl BookingStatus {
    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// A reservation of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking ID.
    pub id: BookingId,
    /// Reserved field.
    pub field_id: FieldId,
    /// Reserved date.
    pub date: NaiveDate,
    /// Reserved hour.
    pub hour: u8,
    /// Customer email.
    pub email: String,
    /// Current status.
    pub status: BookingStatus,
    /// When the booking was made.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Create a new active booking for a slot.
    #[must_use]
    pub fn new(slot: Slot, email: impl Into<String>) -> Self {
        Self {
            id: BookingId::generate(),
            field_id: slot.field_id,
            date: slot.date,
            hour: slot.hour,
            email: email.into(),
            status: BookingStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// The slot this booking refers to.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        Slot {
            field_id: self.field_id,
            date: self.date,
            hour: self.hour,
        }
    }

    /// Whether this booking currently occupies its slot.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }

    /// Whether `email` made this booking (case-insensitive).
    #[must_use]
    pub fn belongs_to(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDate(raw.to_string()))
}

/// Parse an hour given as `"18"` or `"18:00"`.
///
/// Minutes, when present, must be `00`: slots are whole hours.
pub fn parse_hour(raw: &str) -> Result<u8> {
    let raw = raw.trim();
    let hours = match raw.split_once(':') {
        Some((h, m)) if m == "00" => h,
        Some(_) => return Err(CoreError::InvalidHour(raw.to_string())),
        None => raw,
    };

    match hours.parse::<u8>() {
        Ok(h) if h <= 23 => Ok(h),
        _ => Err(CoreError::InvalidHour(raw.to_string())),
    }
}

/// Format an hour as `HH:00` for display.
#[must_use]
pub fn format_hour(hour: u8) -> String {
    format!("{hour:02}:00")
}

//! Core types for the canchas field booking service.
//!
//! This crate provides the domain model shared by the store and the HTTP
//! service:
//!
//! - **Identifiers**: `FieldId`, `BookingId`, `StatementId`, `UserId`, `FavoriteId`
//! - **Fields**: `Field`, `FieldUpdate`, location buckets
//! - **Bookings**: `Booking`, `BookingStatus`, `Slot`
//! - **Statements**: `MonthlyStatement`, `StatementStatus`, `BillingPeriod`
//! - **Profiles**: `Profile`, `Role`, `Favorite`
//!
//! # Money
//!
//! Prices and commissions are stored as `i64` minor currency units
//! (`*_cents`) to avoid floating point rounding.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod booking;
pub mod error;
pub mod field;
pub mod ids;
pub mod profile;
pub mod statement;

pub use booking::{format_hour, parse_date, parse_hour, Booking, BookingStatus, Slot, DATE_FORMAT};
pub use error::{CoreError, Result};
pub use field::{location_bucket, Field, FieldUpdate, UNKNOWN_LOCATION};
pub use ids::{BookingId, FavoriteId, FieldId, IdError, StatementId, UserId};
pub use profile::{Favorite, Profile, Role};
pub use statement::{
    is_past_grace, BillingPeriod, MonthlyStatement, StatementStatus, OVERDUE_GRACE_DAYS,
};

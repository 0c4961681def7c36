//! Storage layer for canchas.
//!
//! The data lives in the booking platform's hosted PostgreSQL database. This
//! crate exposes it through the [`Store`] trait with two implementations:
//!
//! - [`PgStore`]: PostgreSQL through `sqlx`, with embedded migrations
//! - [`MemoryStore`]: in-process maps, for tests and local development
//!
//! # Slot uniqueness
//!
//! Both backends guarantee that at most one active booking exists per
//! `(field_id, date, hour)`. `PgStore` relies on the partial unique index
//! `bookings_active_slot_key`; `MemoryStore` checks and inserts under one
//! write lock. A violating insert fails with [`StoreError::SlotTaken`].
//!
//! # Example
//!
//! ```no_run
//! use canchas_core::Field;
//! use canchas_store::{MemoryStore, Store};
//!
//! # async fn example() -> canchas_store::Result<()> {
//! let store = MemoryStore::new();
//! let field = Field::new("Cancha 5", 12_000);
//! store.put_field(&field).await?;
//!
//! let fetched = store.get_field(&field.id).await?;
//! assert!(fetched.is_some());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use canchas_core::{
    BillingPeriod, Booking, BookingId, BookingStatus, Favorite, Field, FieldId, MonthlyStatement,
    Profile, Slot, StatementId, StatementStatus, UserId,
};

/// Criteria for listing bookings. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    /// Only bookings of this field.
    pub field_id: Option<FieldId>,
    /// Only bookings made with this email (case-insensitive).
    pub email: Option<String>,
    /// Earliest date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest date, inclusive.
    pub to: Option<NaiveDate>,
    /// Only bookings with this status.
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    /// Whether `booking` satisfies the filter.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        self.field_id.map_or(true, |id| booking.field_id == id)
            && self.email.as_deref().map_or(true, |e| booking.belongs_to(e))
            && self.from.map_or(true, |d| booking.date >= d)
            && self.to.map_or(true, |d| booking.date <= d)
            && self.status.map_or(true, |s| booking.status == s)
    }
}

/// Criteria for listing statements. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct StatementFilter {
    /// Only statements of this field.
    pub field_id: Option<FieldId>,
    /// Only statements with this status.
    pub status: Option<StatementStatus>,
}

impl StatementFilter {
    /// Whether `statement` satisfies the filter.
    #[must_use]
    pub fn matches(&self, statement: &MonthlyStatement) -> bool {
        self.field_id.map_or(true, |id| statement.field_id == id)
            && self.status.map_or(true, |s| statement.status == s)
    }
}

/// The storage trait defining all database operations.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Field Operations
    // =========================================================================

    /// Insert or update a field.
    async fn put_field(&self, field: &Field) -> Result<()>;

    /// Get a field by ID.
    async fn get_field(&self, id: &FieldId) -> Result<Option<Field>>;

    /// List fields ordered by name.
    async fn list_fields(&self, active_only: bool) -> Result<Vec<Field>>;

    /// Set the active flag of a field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the field doesn't exist.
    async fn set_field_active(&self, id: &FieldId, active: bool) -> Result<()>;

    // =========================================================================
    // Booking Operations
    // =========================================================================

    /// Find the active booking occupying a slot, if any.
    async fn find_active_booking(&self, slot: &Slot) -> Result<Option<Booking>>;

    /// Insert a new booking.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SlotTaken` if the booking is active and another
    /// active booking already holds its slot.
    async fn insert_booking(&self, booking: &Booking) -> Result<()>;

    /// Get a booking by ID.
    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>>;

    /// Mark a booking cancelled, freeing its slot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the booking doesn't exist.
    async fn cancel_booking(&self, id: &BookingId) -> Result<()>;

    /// List bookings ordered by date and hour.
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>>;

    /// Count active bookings of a field dated in `[from, to_exclusive)`.
    async fn count_active_bookings(
        &self,
        field_id: &FieldId,
        from: NaiveDate,
        to_exclusive: NaiveDate,
    ) -> Result<u32>;

    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// Get a profile by user ID.
    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>>;

    /// Insert or update a profile.
    async fn put_profile(&self, profile: &Profile) -> Result<()>;

    // =========================================================================
    // Favorite Operations
    // =========================================================================

    /// List a user's favorites, newest first.
    async fn list_favorites(&self, user_id: &UserId) -> Result<Vec<Favorite>>;

    /// Add a favorite.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the user already bookmarked the field.
    async fn add_favorite(&self, favorite: &Favorite) -> Result<()>;

    /// Remove a favorite.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is nothing to remove.
    async fn remove_favorite(&self, user_id: &UserId, field_id: &FieldId) -> Result<()>;

    // =========================================================================
    // Statement Operations
    // =========================================================================

    /// Insert a new statement.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the field already has a statement for
    /// the same period.
    async fn insert_statement(&self, statement: &MonthlyStatement) -> Result<()>;

    /// Get a statement by ID.
    async fn get_statement(&self, id: &StatementId) -> Result<Option<MonthlyStatement>>;

    /// Find the statement of a field for a period.
    async fn find_statement_for_period(
        &self,
        field_id: &FieldId,
        period: BillingPeriod,
    ) -> Result<Option<MonthlyStatement>>;

    /// Persist the mutable columns of a statement.
    ///
    /// The write only applies while the stored status is still `expected`,
    /// the status the caller read before changing it.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the statement doesn't exist.
    /// - `StoreError::Conflict` if the stored status is no longer `expected`.
    async fn update_statement(
        &self,
        statement: &MonthlyStatement,
        expected: StatementStatus,
    ) -> Result<()>;

    /// List statements, newest period first.
    async fn list_statements(&self, filter: &StatementFilter) -> Result<Vec<MonthlyStatement>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Persist an overdue statement and deactivate its field atomically.
    ///
    /// The write only applies while the stored statement is still `pending`.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the statement doesn't exist.
    /// - `StoreError::Conflict` if the stored statement is no longer pending.
    async fn mark_statement_overdue(&self, statement: &MonthlyStatement) -> Result<()>;
}

//! In-memory storage implementation.
//!
//! Used by the test suites and for running the service without a database.
//! All state lives behind one `RwLock`, so every compound operation is atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use canchas_core::{
    BillingPeriod, Booking, BookingId, BookingStatus, Favorite, Field, FieldId, MonthlyStatement,
    Profile, Slot, StatementId, StatementStatus, UserId,
};

use crate::error::{Result, StoreError};
use crate::{BookingFilter, StatementFilter, Store};

#[derive(Default)]
struct Tables {
    fields: HashMap<FieldId, Field>,
    bookings: HashMap<BookingId, Booking>,
    profiles: HashMap<UserId, Profile>,
    favorites: Vec<Favorite>,
    statements: HashMap<StatementId, MonthlyStatement>,
}

/// Storage backed by in-process maps.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // =========================================================================
    // Field Operations
    // =========================================================================

    async fn put_field(&self, field: &Field) -> Result<()> {
        self.tables
            .write()
            .await
            .fields
            .insert(field.id, field.clone());
        Ok(())
    }

    async fn get_field(&self, id: &FieldId) -> Result<Option<Field>> {
        Ok(self.tables.read().await.fields.get(id).cloned())
    }

    async fn list_fields(&self, active_only: bool) -> Result<Vec<Field>> {
        let tables = self.tables.read().await;
        let mut fields: Vec<Field> = tables
            .fields
            .values()
            .filter(|f| !active_only || f.active)
            .cloned()
            .collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fields)
    }

    async fn set_field_active(&self, id: &FieldId, active: bool) -> Result<()> {
        let mut tables = self.tables.write().await;
        let field = tables
            .fields
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("field", id))?;
        field.active = active;
        field.updated_at = Utc::now();
        Ok(())
    }

    // =========================================================================
    // Booking Operations
    // =========================================================================

    async fn find_active_booking(&self, slot: &Slot) -> Result<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.is_active() && b.slot() == *slot)
            .cloned())
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let mut tables = self.tables.write().await;

        if booking.is_active() {
            let slot = booking.slot();
            if tables
                .bookings
                .values()
                .any(|b| b.is_active() && b.slot() == slot)
            {
                return Err(StoreError::SlotTaken);
            }
        }

        tables.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(id).cloned())
    }

    async fn cancel_booking(&self, id: &BookingId) -> Result<()> {
        let mut tables = self.tables.write().await;
        let booking = tables
            .bookings
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("booking", id))?;
        booking.status = BookingStatus::Cancelled;
        Ok(())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.date, b.hour, b.created_at));
        Ok(bookings)
    }

    async fn count_active_bookings(
        &self,
        field_id: &FieldId,
        from: NaiveDate,
        to_exclusive: NaiveDate,
    ) -> Result<u32> {
        let tables = self.tables.read().await;
        let count = tables
            .bookings
            .values()
            .filter(|b| {
                b.is_active() && b.field_id == *field_id && b.date >= from && b.date < to_exclusive
            })
            .count();
        u32::try_from(count).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(id).cloned())
    }

    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.id, profile.clone());
        Ok(())
    }

    // =========================================================================
    // Favorite Operations
    // =========================================================================

    async fn list_favorites(&self, user_id: &UserId) -> Result<Vec<Favorite>> {
        let tables = self.tables.read().await;
        let mut favorites: Vec<Favorite> = tables
            .favorites
            .iter()
            .filter(|f| f.user_id == *user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(favorites)
    }

    async fn add_favorite(&self, favorite: &Favorite) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.field_id == favorite.field_id)
        {
            return Err(StoreError::Conflict("favorite already exists".into()));
        }
        tables.favorites.push(favorite.clone());
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &UserId, field_id: &FieldId) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.user_id == *user_id && f.field_id == *field_id));
        if tables.favorites.len() == before {
            return Err(StoreError::not_found("favorite", field_id));
        }
        Ok(())
    }

    // =========================================================================
    // Statement Operations
    // =========================================================================

    async fn insert_statement(&self, statement: &MonthlyStatement) -> Result<()> {
        let mut tables = self.tables.write().await;
        let period = statement.period();
        if tables
            .statements
            .values()
            .any(|s| s.field_id == statement.field_id && s.period() == period)
        {
            return Err(StoreError::Conflict(format!(
                "statement already exists for {}/{}",
                period.month, period.year
            )));
        }
        tables.statements.insert(statement.id, statement.clone());
        Ok(())
    }

    async fn get_statement(&self, id: &StatementId) -> Result<Option<MonthlyStatement>> {
        Ok(self.tables.read().await.statements.get(id).cloned())
    }

    async fn find_statement_for_period(
        &self,
        field_id: &FieldId,
        period: BillingPeriod,
    ) -> Result<Option<MonthlyStatement>> {
        let tables = self.tables.read().await;
        Ok(tables
            .statements
            .values()
            .find(|s| s.field_id == *field_id && s.period() == period)
            .cloned())
    }

    async fn update_statement(
        &self,
        statement: &MonthlyStatement,
        expected: StatementStatus,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .statements
            .get_mut(&statement.id)
            .ok_or_else(|| StoreError::not_found("statement", statement.id))?;
        if stored.status != expected {
            return Err(StoreError::Conflict(format!(
                "statement {} is {}",
                statement.id, stored.status
            )));
        }
        *stored = statement.clone();
        Ok(())
    }

    async fn list_statements(&self, filter: &StatementFilter) -> Result<Vec<MonthlyStatement>> {
        let tables = self.tables.read().await;
        let mut statements: Vec<MonthlyStatement> = tables
            .statements
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        statements.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(statements)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    async fn mark_statement_overdue(&self, statement: &MonthlyStatement) -> Result<()> {
        let mut tables = self.tables.write().await;

        let stored = tables
            .statements
            .get_mut(&statement.id)
            .ok_or_else(|| StoreError::not_found("statement", statement.id))?;
        if stored.status != StatementStatus::Pending {
            return Err(StoreError::Conflict(format!(
                "statement {} is {}",
                statement.id, stored.status
            )));
        }
        *stored = statement.clone();

        if let Some(field) = tables.fields.get_mut(&statement.field_id) {
            field.active = false;
            field.updated_at = Utc::now();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn slot(field_id: FieldId, hour: u8) -> Slot {
        Slot::new(
            field_id,
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            hour,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn second_active_booking_for_slot_is_rejected() {
        let store = MemoryStore::new();
        let field_id = FieldId::generate();

        store
            .insert_booking(&Booking::new(slot(field_id, 19), "a@example.com"))
            .await
            .unwrap();
        let err = store
            .insert_booking(&Booking::new(slot(field_id, 19), "b@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::SlotTaken));
    }

    #[tokio::test]
    async fn cancelled_booking_frees_slot() {
        let store = MemoryStore::new();
        let field_id = FieldId::generate();
        let first = Booking::new(slot(field_id, 19), "a@example.com");

        store.insert_booking(&first).await.unwrap();
        store.cancel_booking(&first.id).await.unwrap();

        assert!(store.find_active_booking(&slot(field_id, 19)).await.unwrap().is_none());
        store
            .insert_booking(&Booking::new(slot(field_id, 19), "b@example.com"))
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_for_one_slot_yield_one_booking() {
        let store = Arc::new(MemoryStore::new());
        let field_id = FieldId::generate();

        let attempts = (0..16).map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .insert_booking(&Booking::new(slot(field_id, 21), format!("u{i}@example.com")))
                    .await
            })
        });

        let results = futures::future::join_all(attempts).await;
        let successes = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(()))))
            .count();

        assert_eq!(successes, 1);
        let active = store
            .list_bookings(&BookingFilter {
                field_id: Some(field_id),
                status: Some(BookingStatus::Active),
                ..BookingFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn overdue_deactivates_field() {
        let store = MemoryStore::new();
        let field = Field::new("Cancha 2", 8_000);
        store.put_field(&field).await.unwrap();

        let mut statement = MonthlyStatement::issue(
            field.id,
            BillingPeriod::new(8, 2026).unwrap(),
            3,
            500,
            10,
        );
        store.insert_statement(&statement).await.unwrap();

        statement.mark_overdue().unwrap();
        store.mark_statement_overdue(&statement).await.unwrap();

        let field = store.get_field(&field.id).await.unwrap().unwrap();
        assert!(!field.active);
        let stored = store.get_statement(&statement.id).await.unwrap().unwrap();
        assert_eq!(stored.status, StatementStatus::Overdue);

        // A second sweep over a stale copy is refused.
        assert!(matches!(
            store.mark_statement_overdue(&statement).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_statement_period_is_a_conflict() {
        let store = MemoryStore::new();
        let field_id = FieldId::generate();
        let period = BillingPeriod::new(5, 2026).unwrap();

        store
            .insert_statement(&MonthlyStatement::issue(field_id, period, 1, 500, 10))
            .await
            .unwrap();
        let err = store
            .insert_statement(&MonthlyStatement::issue(field_id, period, 2, 500, 10))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn statement_update_rejects_stale_status() {
        let store = MemoryStore::new();
        let field = Field::new("Cancha", 10_000);
        store.put_field(&field).await.unwrap();
        let issued =
            MonthlyStatement::issue(field.id, BillingPeriod::new(5, 2026).unwrap(), 2, 500, 10);
        store.insert_statement(&issued).await.unwrap();

        // The sweep lands while a checkout is in flight
        let mut overdue = issued.clone();
        overdue.mark_overdue().unwrap();
        store.mark_statement_overdue(&overdue).await.unwrap();

        let mut checkout = issued.clone();
        checkout.begin_checkout("txn_late").unwrap();
        let err = store
            .update_statement(&checkout, StatementStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = store.get_statement(&issued.id).await.unwrap().unwrap();
        assert_eq!(stored.status, StatementStatus::Overdue);

        let mut retried = stored.clone();
        retried.begin_checkout("txn_late").unwrap();
        store
            .update_statement(&retried, StatementStatus::Overdue)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn favorites_are_unique_per_user_and_field() {
        let store = MemoryStore::new();
        let user = UserId::generate();
        let field = FieldId::generate();

        store.add_favorite(&Favorite::new(user, field)).await.unwrap();
        assert!(store.add_favorite(&Favorite::new(user, field)).await.is_err());

        store.remove_favorite(&user, &field).await.unwrap();
        assert!(matches!(
            store.remove_favorite(&user, &field).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn count_active_bookings_respects_period_bounds() {
        let store = MemoryStore::new();
        let field_id = FieldId::generate();
        let period = BillingPeriod::new(10, 2026).unwrap();

        for (day, hour) in [(1, 10), (31, 22), (20, 18)] {
            let slot = Slot::new(
                field_id,
                NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
                hour,
            )
            .unwrap();
            store
                .insert_booking(&Booking::new(slot, "x@example.com"))
                .await
                .unwrap();
        }
        let outside = Slot::new(field_id, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), 10).unwrap();
        store
            .insert_booking(&Booking::new(outside, "x@example.com"))
            .await
            .unwrap();

        let count = store
            .count_active_bookings(&field_id, period.first_day(), period.end_exclusive())
            .await
            .unwrap();
        assert_eq!(count, 3);
    }
}

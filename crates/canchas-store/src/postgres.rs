//! PostgreSQL storage implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};
use uuid::Uuid;

use canchas_core::{
    BillingPeriod, Booking, BookingId, BookingStatus, Favorite, FavoriteId, Field, FieldId,
    MonthlyStatement, Profile, Role, Slot, StatementId, StatementStatus, UserId,
};

use crate::error::{Result, StoreError};
use crate::{BookingFilter, StatementFilter, Store};

/// Name of the partial unique index guarding active slots.
const ACTIVE_SLOT_INDEX: &str = "bookings_active_slot_key";

const FIELD_COLUMNS: &str =
    "id, name, location, price_per_hour_cents, active, owner_email, images, created_at, updated_at";
const BOOKING_COLUMNS: &str = "id, field_id, date, hour, email, status, created_at";
const STATEMENT_COLUMNS: &str = "id, field_id, month, year, reservations_count, amount_due_cents, \
     status, due_date, paid_at, transaction_id, payment_method, created_at, updated_at";

/// Storage backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database at `url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the pool cannot be created.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Explain why a conditional statement update matched no row.
    async fn stale_statement(&self, id: &StatementId) -> StoreError {
        let current: std::result::Result<Option<(String,)>, sqlx::Error> =
            sqlx::query_as("select status from monthly_statements where id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await;
        match current {
            Ok(Some((status,))) => StoreError::Conflict(format!("statement {id} is {status}")),
            Ok(None) => StoreError::not_found("statement", id),
            Err(e) => e.into(),
        }
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(FromRow)]
struct FieldRow {
    id: Uuid,
    name: String,
    location: Option<String>,
    price_per_hour_cents: i64,
    active: bool,
    owner_email: Option<String>,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FieldRow> for Field {
    fn from(row: FieldRow) -> Self {
        Self {
            id: FieldId::from_uuid(row.id),
            name: row.name,
            location: row.location,
            price_per_hour_cents: row.price_per_hour_cents,
            active: row.active,
            owner_email: row.owner_email,
            images: row.images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: Uuid,
    field_id: Uuid,
    date: NaiveDate,
    hour: i16,
    email: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            field_id: FieldId::from_uuid(row.field_id),
            date: row.date,
            hour: u8::try_from(row.hour).map_err(|e| StoreError::Serialization(e.to_string()))?,
            email: row.email,
            status: row.status.parse().map_err(StoreError::Serialization)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    role: String,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            role: row.role.parse::<Role>().map_err(StoreError::Serialization)?,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct FavoriteRow {
    id: Uuid,
    user_id: Uuid,
    field_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<FavoriteRow> for Favorite {
    fn from(row: FavoriteRow) -> Self {
        Self {
            id: FavoriteId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            field_id: FieldId::from_uuid(row.field_id),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct StatementRow {
    id: Uuid,
    field_id: Uuid,
    month: i32,
    year: i32,
    reservations_count: i32,
    amount_due_cents: i64,
    status: String,
    due_date: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    transaction_id: Option<String>,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StatementRow> for MonthlyStatement {
    type Error = StoreError;

    fn try_from(row: StatementRow) -> Result<Self> {
        let to_u32 = |v: i32| u32::try_from(v).map_err(|e| StoreError::Serialization(e.to_string()));
        Ok(Self {
            id: StatementId::from_uuid(row.id),
            field_id: FieldId::from_uuid(row.field_id),
            month: to_u32(row.month)?,
            year: row.year,
            reservations_count: to_u32(row.reservations_count)?,
            amount_due_cents: row.amount_due_cents,
            status: row
                .status
                .parse::<StatementStatus>()
                .map_err(StoreError::Serialization)?,
            due_date: row.due_date,
            paid_at: row.paid_at,
            transaction_id: row.transaction_id,
            payment_method: row.payment_method,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl Store for PgStore {
    // =========================================================================
    // Field Operations
    // =========================================================================

    async fn put_field(&self, field: &Field) -> Result<()> {
        sqlx::query(
            r"
            insert into fields
                (id, name, location, price_per_hour_cents, active, owner_email, images, created_at, updated_at)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            on conflict (id) do update set
                name = excluded.name,
                location = excluded.location,
                price_per_hour_cents = excluded.price_per_hour_cents,
                active = excluded.active,
                owner_email = excluded.owner_email,
                images = excluded.images,
                updated_at = excluded.updated_at
            ",
        )
        .bind(field.id.as_uuid())
        .bind(&field.name)
        .bind(&field.location)
        .bind(field.price_per_hour_cents)
        .bind(field.active)
        .bind(&field.owner_email)
        .bind(&field.images)
        .bind(field.created_at)
        .bind(field.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_field(&self, id: &FieldId) -> Result<Option<Field>> {
        let row: Option<FieldRow> =
            sqlx::query_as(&format!("select {FIELD_COLUMNS} from fields where id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Field::from))
    }

    async fn list_fields(&self, active_only: bool) -> Result<Vec<Field>> {
        let rows: Vec<FieldRow> = sqlx::query_as(&format!(
            "select {FIELD_COLUMNS} from fields where ($1 = false or active) order by name"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Field::from).collect())
    }

    async fn set_field_active(&self, id: &FieldId, active: bool) -> Result<()> {
        let result = sqlx::query("update fields set active = $2, updated_at = now() where id = $1")
            .bind(id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("field", id));
        }
        Ok(())
    }

    // =========================================================================
    // Booking Operations
    // =========================================================================

    async fn find_active_booking(&self, slot: &Slot) -> Result<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "select {BOOKING_COLUMNS} from bookings \
             where field_id = $1 and date = $2 and hour = $3 and status = 'active'"
        ))
        .bind(slot.field_id.as_uuid())
        .bind(slot.date)
        .bind(i16::from(slot.hour))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let result = sqlx::query(
            "insert into bookings (id, field_id, date, hour, email, status, created_at) \
             values ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.field_id.as_uuid())
        .bind(booking.date)
        .bind(i16::from(booking.hour))
        .bind(&booking.email)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some(ACTIVE_SLOT_INDEX) => {
                debug!(field_id = %booking.field_id, date = %booking.date, hour = booking.hour, "Slot already taken");
                Err(StoreError::SlotTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("select {BOOKING_COLUMNS} from bookings where id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Booking::try_from).transpose()
    }

    async fn cancel_booking(&self, id: &BookingId) -> Result<()> {
        let result = sqlx::query("update bookings set status = $2 where id = $1")
            .bind(id.as_uuid())
            .bind(BookingStatus::Cancelled.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("booking", id));
        }
        Ok(())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "select {BOOKING_COLUMNS} from bookings \
             where ($1::uuid is null or field_id = $1) \
               and ($2::text is null or lower(email) = lower($2)) \
               and ($3::date is null or date >= $3) \
               and ($4::date is null or date <= $4) \
               and ($5::text is null or status = $5) \
             order by date, hour, created_at"
        ))
        .bind(filter.field_id.map(|id| *id.as_uuid()))
        .bind(filter.email.as_deref().map(str::trim))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn count_active_bookings(
        &self,
        field_id: &FieldId,
        from: NaiveDate,
        to_exclusive: NaiveDate,
    ) -> Result<u32> {
        let (count,): (i64,) = sqlx::query_as(
            "select count(*) from bookings \
             where field_id = $1 and status = 'active' and date >= $2 and date < $3",
        )
        .bind(field_id.as_uuid())
        .bind(from)
        .bind(to_exclusive)
        .fetch_one(&self.pool)
        .await?;
        u32::try_from(count).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "select id, role, first_name, last_name, phone, created_at, updated_at \
             from profiles where id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn put_profile(&self, profile: &Profile) -> Result<()> {
        sqlx::query(
            r"
            insert into profiles (id, role, first_name, last_name, phone, created_at, updated_at)
            values ($1, $2, $3, $4, $5, $6, $7)
            on conflict (id) do update set
                role = excluded.role,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                phone = excluded.phone,
                updated_at = excluded.updated_at
            ",
        )
        .bind(profile.id.as_uuid())
        .bind(profile.role.as_str())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Favorite Operations
    // =========================================================================

    async fn list_favorites(&self, user_id: &UserId) -> Result<Vec<Favorite>> {
        let rows: Vec<FavoriteRow> = sqlx::query_as(
            "select id, user_id, field_id, created_at from favorites \
             where user_id = $1 order by created_at desc",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Favorite::from).collect())
    }

    async fn add_favorite(&self, favorite: &Favorite) -> Result<()> {
        sqlx::query(
            "insert into favorites (id, user_id, field_id, created_at) values ($1, $2, $3, $4)",
        )
        .bind(favorite.id.as_uuid())
        .bind(favorite.user_id.as_uuid())
        .bind(favorite.field_id.as_uuid())
        .bind(favorite.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: &UserId, field_id: &FieldId) -> Result<()> {
        let result = sqlx::query("delete from favorites where user_id = $1 and field_id = $2")
            .bind(user_id.as_uuid())
            .bind(field_id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("favorite", field_id));
        }
        Ok(())
    }

    // =========================================================================
    // Statement Operations
    // =========================================================================

    async fn insert_statement(&self, statement: &MonthlyStatement) -> Result<()> {
        sqlx::query(&format!(
            "insert into monthly_statements ({STATEMENT_COLUMNS}) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(statement.id.as_uuid())
        .bind(statement.field_id.as_uuid())
        .bind(to_i32(statement.month)?)
        .bind(statement.year)
        .bind(to_i32(statement.reservations_count)?)
        .bind(statement.amount_due_cents)
        .bind(statement.status.as_str())
        .bind(statement.due_date)
        .bind(statement.paid_at)
        .bind(&statement.transaction_id)
        .bind(&statement.payment_method)
        .bind(statement.created_at)
        .bind(statement.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_statement(&self, id: &StatementId) -> Result<Option<MonthlyStatement>> {
        let row: Option<StatementRow> = sqlx::query_as(&format!(
            "select {STATEMENT_COLUMNS} from monthly_statements where id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(MonthlyStatement::try_from).transpose()
    }

    async fn find_statement_for_period(
        &self,
        field_id: &FieldId,
        period: BillingPeriod,
    ) -> Result<Option<MonthlyStatement>> {
        let row: Option<StatementRow> = sqlx::query_as(&format!(
            "select {STATEMENT_COLUMNS} from monthly_statements \
             where field_id = $1 and month = $2 and year = $3"
        ))
        .bind(field_id.as_uuid())
        .bind(to_i32(period.month)?)
        .bind(period.year)
        .fetch_optional(&self.pool)
        .await?;
        row.map(MonthlyStatement::try_from).transpose()
    }

    async fn update_statement(
        &self,
        statement: &MonthlyStatement,
        expected: StatementStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            update monthly_statements set
                status = $2,
                paid_at = $3,
                transaction_id = $4,
                payment_method = $5,
                updated_at = $6
            where id = $1 and status = $7
            ",
        )
        .bind(statement.id.as_uuid())
        .bind(statement.status.as_str())
        .bind(statement.paid_at)
        .bind(&statement.transaction_id)
        .bind(&statement.payment_method)
        .bind(statement.updated_at)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(self.stale_statement(&statement.id).await);
        }
        Ok(())
    }

    async fn list_statements(&self, filter: &StatementFilter) -> Result<Vec<MonthlyStatement>> {
        let rows: Vec<StatementRow> = sqlx::query_as(&format!(
            "select {STATEMENT_COLUMNS} from monthly_statements \
             where ($1::uuid is null or field_id = $1) \
               and ($2::text is null or status = $2) \
             order by year desc, month desc"
        ))
        .bind(filter.field_id.map(|id| *id.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MonthlyStatement::try_from).collect()
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    async fn mark_statement_overdue(&self, statement: &MonthlyStatement) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "update monthly_statements set status = $2, updated_at = $3 \
             where id = $1 and status = 'pending'",
        )
        .bind(statement.id.as_uuid())
        .bind(statement.status.as_str())
        .bind(statement.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.stale_statement(&statement.id).await);
        }

        sqlx::query("update fields set active = false, updated_at = now() where id = $1")
            .bind(statement.field_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Live database tests. Run with `DATABASE_URL` set and `--ignored`.

    use super::*;

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let store = PgStore::connect(&url, 2).await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database"]
    async fn active_slot_index_rejects_double_booking() {
        let store = store().await;
        let field = Field::new("Cancha PG", 9_000);
        store.put_field(&field).await.unwrap();

        let slot = Slot::new(field.id, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(), 20).unwrap();
        store
            .insert_booking(&Booking::new(slot, "a@example.com"))
            .await
            .unwrap();
        let err = store
            .insert_booking(&Booking::new(slot, "b@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::SlotTaken));
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database"]
    async fn overdue_statement_deactivates_field_in_one_transaction() {
        let store = store().await;
        let field = Field::new("Cancha Morosa", 9_000);
        store.put_field(&field).await.unwrap();

        let mut statement =
            MonthlyStatement::issue(field.id, BillingPeriod::new(1, 2026).unwrap(), 4, 500, 10);
        store.insert_statement(&statement).await.unwrap();
        statement.mark_overdue().unwrap();
        store.mark_statement_overdue(&statement).await.unwrap();

        assert!(!store.get_field(&field.id).await.unwrap().unwrap().active);
        assert!(matches!(
            store.mark_statement_overdue(&statement).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database"]
    async fn statement_update_requires_expected_status() {
        let store = store().await;
        let field = Field::new("Cancha Checkout", 9_000);
        store.put_field(&field).await.unwrap();

        let issued =
            MonthlyStatement::issue(field.id, BillingPeriod::new(2, 2026).unwrap(), 1, 500, 10);
        store.insert_statement(&issued).await.unwrap();
        let mut overdue = issued.clone();
        overdue.mark_overdue().unwrap();
        store.mark_statement_overdue(&overdue).await.unwrap();

        let mut checkout = issued.clone();
        checkout.begin_checkout("txn_pg").unwrap();
        assert!(matches!(
            store
                .update_statement(&checkout, StatementStatus::Pending)
                .await,
            Err(StoreError::Conflict(_))
        ));
        store
            .update_statement(&checkout, StatementStatus::Overdue)
            .await
            .unwrap();
    }
}

//! Scheduled statement jobs.
//!
//! Both jobs are exposed as service-key endpoints for an external cron. The
//! overdue sweep can also run in-process on a fixed interval.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use canchas_core::{BillingPeriod, FieldId, MonthlyStatement, StatementId, StatementStatus};
use canchas_store::{StatementFilter, Store, StoreError};

use crate::state::AppState;

/// Outcome of an overdue sweep.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Statements moved to `overdue`.
    pub overdue: Vec<StatementId>,
    /// Fields deactivated as a result.
    pub deactivated_fields: Vec<FieldId>,
}

/// Mark every pending statement more than five days past due as overdue and
/// deactivate its field.
///
/// Each statement is handled atomically on its own. A statement paid or
/// checked out between the listing and the write is skipped.
pub async fn run_overdue_sweep(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<SweepReport, StoreError> {
    let pending = store
        .list_statements(&StatementFilter {
            status: Some(StatementStatus::Pending),
            ..StatementFilter::default()
        })
        .await?;

    let mut report = SweepReport::default();
    for mut statement in pending.into_iter().filter(|s| s.is_overdue_at(now)) {
        if let Err(e) = statement.mark_overdue() {
            warn!(statement_id = %statement.id, error = %e, "Skipping statement");
            continue;
        }

        match store.mark_statement_overdue(&statement).await {
            Ok(()) => {
                info!(
                    statement_id = %statement.id,
                    field_id = %statement.field_id,
                    due_date = %statement.due_date,
                    "Statement overdue - field deactivated"
                );
                report.overdue.push(statement.id);
                if !report.deactivated_fields.contains(&statement.field_id) {
                    report.deactivated_fields.push(statement.field_id);
                }
            }
            Err(StoreError::Conflict(reason)) => {
                debug!(statement_id = %statement.id, %reason, "Statement changed during sweep");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// Outcome of monthly statement generation.
#[derive(Debug, Default, Serialize)]
pub struct GenerationReport {
    /// Billed month.
    pub month: u32,
    /// Billed year.
    pub year: i32,
    /// Newly issued statements.
    pub created: Vec<StatementId>,
    /// Fields that already had a statement for the period.
    pub skipped_existing: u32,
    /// Fields with no active bookings in the period.
    pub skipped_empty: u32,
}

/// Issue a pending statement for every field with active bookings in
/// `period` that has none yet.
pub async fn generate_statements(
    store: &dyn Store,
    period: BillingPeriod,
    commission_per_booking_cents: i64,
    due_days: u32,
) -> Result<GenerationReport, StoreError> {
    let mut report = GenerationReport {
        month: period.month,
        year: period.year,
        ..GenerationReport::default()
    };

    for field in store.list_fields(false).await? {
        if store
            .find_statement_for_period(&field.id, period)
            .await?
            .is_some()
        {
            report.skipped_existing += 1;
            continue;
        }

        let count = store
            .count_active_bookings(&field.id, period.first_day(), period.end_exclusive())
            .await?;
        if count == 0 {
            report.skipped_empty += 1;
            continue;
        }

        let statement =
            MonthlyStatement::issue(field.id, period, count, commission_per_booking_cents, due_days);

        match store.insert_statement(&statement).await {
            Ok(()) => {
                info!(
                    statement_id = %statement.id,
                    field_id = %field.id,
                    reservations = count,
                    amount_cents = statement.amount_due_cents,
                    "Statement issued"
                );
                report.created.push(statement.id);
            }
            // Issued concurrently by another run
            Err(StoreError::Conflict(_)) => report.skipped_existing += 1,
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

/// Start the in-process overdue sweeper.
pub fn spawn_overdue_sweeper(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "Overdue sweeper started");

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match run_overdue_sweep(state.store.as_ref(), Utc::now()).await {
                Ok(report) if report.overdue.is_empty() => debug!("Overdue sweep: nothing due"),
                Ok(report) => info!(overdue = report.overdue.len(), "Overdue sweep completed"),
                Err(e) => warn!(error = %e, "Overdue sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use canchas_core::{Booking, Field, Slot};
    use canchas_store::MemoryStore;

    use super::*;

    async fn field_with_statement(
        store: &MemoryStore,
        due_date: DateTime<Utc>,
    ) -> (Field, MonthlyStatement) {
        let field = Field::new("Cancha", 10_000);
        store.put_field(&field).await.unwrap();
        let mut statement =
            MonthlyStatement::issue(field.id, BillingPeriod::new(9, 2026).unwrap(), 2, 500, 10);
        statement.due_date = due_date;
        store.insert_statement(&statement).await.unwrap();
        (field, statement)
    }

    #[tokio::test]
    async fn sweep_respects_grace_boundary() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (on_time, _) = field_with_statement(&store, now - ChronoDuration::days(5)).await;
        let (late, late_statement) = field_with_statement(
            &store,
            now - ChronoDuration::days(5) - ChronoDuration::seconds(1),
        )
        .await;

        let report = run_overdue_sweep(&store, now).await.unwrap();

        assert_eq!(report.overdue, vec![late_statement.id]);
        assert_eq!(report.deactivated_fields, vec![late.id]);
        assert!(store.get_field(&on_time.id).await.unwrap().unwrap().active);
        assert!(!store.get_field(&late.id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn sweep_ignores_statements_in_checkout() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (field, mut statement) =
            field_with_statement(&store, now - ChronoDuration::days(30)).await;
        statement.begin_checkout("txn_1").unwrap();
        store
            .update_statement(&statement, StatementStatus::Pending)
            .await
            .unwrap();

        let report = run_overdue_sweep(&store, now).await.unwrap();

        assert!(report.overdue.is_empty());
        assert!(store.get_field(&field.id).await.unwrap().unwrap().active);
    }

    #[tokio::test]
    async fn generation_counts_active_bookings_and_is_idempotent() {
        let store = MemoryStore::new();
        let busy = Field::new("Con reservas", 10_000);
        let idle = Field::new("Sin reservas", 10_000);
        store.put_field(&busy).await.unwrap();
        store.put_field(&idle).await.unwrap();

        let period = BillingPeriod::new(9, 2026).unwrap();
        for hour in [18, 19, 20] {
            let slot = Slot::new(busy.id, period.first_day(), hour).unwrap();
            store
                .insert_booking(&Booking::new(slot, "x@example.com"))
                .await
                .unwrap();
        }
        let cancelled = Booking::new(
            Slot::new(busy.id, period.first_day(), 21).unwrap(),
            "y@example.com",
        );
        store.insert_booking(&cancelled).await.unwrap();
        store.cancel_booking(&cancelled.id).await.unwrap();

        let first = generate_statements(&store, period, 500, 10).await.unwrap();
        assert_eq!(first.created.len(), 1);
        assert_eq!(first.skipped_empty, 1);

        let statement = store
            .find_statement_for_period(&busy.id, period)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(statement.reservations_count, 3);
        assert_eq!(statement.amount_due_cents, 1_500);

        let second = generate_statements(&store, period, 500, 10).await.unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped_existing, 1);
    }
}

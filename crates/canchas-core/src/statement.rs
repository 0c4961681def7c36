//! Monthly commission statements.
//!
//! Each field gets one statement per calendar month charging a commission per
//! active booking. Statements move through
//!
//! ```text
//! pending ──checkout──▶ processing ──completed──▶ paid
//!    │                    │  ▲
//!    │                    └──┼──payment_failed──▶ failed ──checkout──┐
//!    │                       └───────────────────────────────────────┘
//!    └──sweep (due + 5 days)──▶ overdue ──checkout──▶ processing
//! ```
//!
//! A completed payment reported by the gateway is accepted from any unpaid
//! status; `paid` is terminal.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{FieldId, StatementId};

/// Days past `due_date` before an unpaid statement becomes overdue.
pub const OVERDUE_GRACE_DAYS: i64 = 5;

/// Statement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    /// Issued, waiting for payment.
    Pending,
    /// A checkout was started with the payment gateway.
    Processing,
    /// Payment completed.
    Paid,
    /// The gateway reported a failed payment.
    Failed,
    /// Unpaid past the grace period; the field is deactivated.
    Overdue,
}

impl StatementStatus {
    /// Lowercase name as stored.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Overdue => "overdue",
        }
    }

    /// Whether a statement may move from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Processing | Self::Overdue)
                | (
                    Self::Processing,
                    Self::Processing | Self::Paid | Self::Failed
                )
                | (Self::Failed | Self::Overdue, Self::Processing)
                | (Self::Pending | Self::Failed | Self::Overdue, Self::Paid)
        )
    }
}

impl fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatementStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "overdue" => Ok(Self::Overdue),
            other => Err(format!("unknown statement status: {other}")),
        }
    }
}

/// A calendar month being billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingPeriod {
    /// Month, `1..=12`.
    pub month: u32,
    /// Year.
    pub year: i32,
}

impl BillingPeriod {
    /// Create a period, validating the month.
    pub fn new(month: u32, year: i32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(CoreError::InvalidPeriod { month, year });
        }
        Ok(Self { month, year })
    }

    /// The month before the one containing `date`.
    #[must_use]
    pub fn previous(date: NaiveDate) -> Self {
        if date.month() == 1 {
            Self {
                month: 12,
                year: date.year() - 1,
            }
        } else {
            Self {
                month: date.month() - 1,
                year: date.year(),
            }
        }
    }

    /// First day of the period.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// First day after the period (exclusive end).
    #[must_use]
    pub fn end_exclusive(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }

    /// Due date: start of the following month plus `due_days`.
    #[must_use]
    pub fn due_date(&self, due_days: u32) -> DateTime<Utc> {
        let start = self.end_exclusive().and_time(NaiveTime::default());
        start.and_utc() + Duration::days(i64::from(due_days))
    }
}

/// A monthly commission statement for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStatement {
    /// Statement ID.
    pub id: StatementId,
    /// Billed field.
    pub field_id: FieldId,
    /// Billed month, `1..=12`.
    pub month: u32,
    /// Billed year.
    pub year: i32,
    /// Active bookings counted for the period.
    pub reservations_count: u32,
    /// Commission owed in minor currency units.
    pub amount_due_cents: i64,
    /// Lifecycle status.
    pub status: StatementStatus,
    /// Payment deadline.
    pub due_date: DateTime<Utc>,
    /// When the gateway confirmed payment.
    pub paid_at: Option<DateTime<Utc>>,
    /// Gateway transaction of the latest checkout.
    pub transaction_id: Option<String>,
    /// Payment method reported by the gateway.
    pub payment_method: Option<String>,
    /// When the statement was issued.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl MonthlyStatement {
    /// Issue a pending statement for `period`.
    #[must_use]
    pub fn issue(
        field_id: FieldId,
        period: BillingPeriod,
        reservations_count: u32,
        commission_per_booking_cents: i64,
        due_days: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StatementId::generate(),
            field_id,
            month: period.month,
            year: period.year,
            reservations_count,
            amount_due_cents: i64::from(reservations_count) * commission_per_booking_cents,
            status: StatementStatus::Pending,
            due_date: period.due_date(due_days),
            paid_at: None,
            transaction_id: None,
            payment_method: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The billed period.
    #[must_use]
    pub const fn period(&self) -> BillingPeriod {
        BillingPeriod {
            month: self.month,
            year: self.year,
        }
    }

    fn transition(&mut self, to: StatementStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// A checkout was created with the gateway.
    pub fn begin_checkout(&mut self, transaction_id: impl Into<String>) -> Result<()> {
        self.transition(StatementStatus::Processing)?;
        self.transaction_id = Some(transaction_id.into());
        Ok(())
    }

    /// The gateway confirmed payment.
    pub fn mark_paid(
        &mut self,
        transaction_id: impl Into<String>,
        payment_method: Option<String>,
        paid_at: DateTime<Utc>,
    ) -> Result<()> {
        self.transition(StatementStatus::Paid)?;
        self.transaction_id = Some(transaction_id.into());
        self.payment_method = payment_method;
        self.paid_at = Some(paid_at);
        Ok(())
    }

    /// The gateway reported a failed payment.
    pub fn mark_failed(&mut self) -> Result<()> {
        self.transition(StatementStatus::Failed)
    }

    /// The grace period elapsed without payment.
    pub fn mark_overdue(&mut self) -> Result<()> {
        self.transition(StatementStatus::Overdue)
    }

    /// Whether the nightly sweep should mark this statement overdue at `now`.
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status == StatementStatus::Pending && is_past_grace(self.due_date, now)
    }
}

/// Strictly more than [`OVERDUE_GRACE_DAYS`] have elapsed since `due_date`.
#[must_use]
pub fn is_past_grace(due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(due_date) > Duration::days(OVERDUE_GRACE_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(due_date: DateTime<Utc>) -> MonthlyStatement {
        let mut s = MonthlyStatement::issue(
            FieldId::generate(),
            BillingPeriod::new(9, 2026).unwrap(),
            12,
            500,
            10,
        );
        s.due_date = due_date;
        s
    }

    #[test]
    fn exactly_five_days_is_not_overdue() {
        let now = Utc::now();
        let s = pending(now - Duration::days(5));
        assert!(!s.is_overdue_at(now));
    }

    #[test]
    fn five_days_and_one_second_is_overdue() {
        let now = Utc::now();
        let s = pending(now - Duration::days(5) - Duration::seconds(1));
        assert!(s.is_overdue_at(now));
    }

    #[test]
    fn only_pending_statements_go_overdue() {
        let now = Utc::now();
        let mut s = pending(now - Duration::days(30));
        s.begin_checkout("txn_1").unwrap();
        assert!(!s.is_overdue_at(now));
    }

    #[test]
    fn issue_computes_amount_and_due_date() {
        let period = BillingPeriod::new(12, 2026).unwrap();
        let s = MonthlyStatement::issue(FieldId::generate(), period, 7, 350, 10);

        assert_eq!(s.amount_due_cents, 2450);
        assert_eq!(s.status, StatementStatus::Pending);
        assert_eq!(
            s.due_date.date_naive(),
            NaiveDate::from_ymd_opt(2027, 1, 11).unwrap()
        );
    }

    #[test]
    fn checkout_then_paid() {
        let mut s = pending(Utc::now());
        s.begin_checkout("txn_01").unwrap();
        assert_eq!(s.status, StatementStatus::Processing);
        assert_eq!(s.transaction_id.as_deref(), Some("txn_01"));

        let paid_at = Utc::now();
        s.mark_paid("txn_01", Some("card".into()), paid_at).unwrap();
        assert_eq!(s.status, StatementStatus::Paid);
        assert_eq!(s.paid_at, Some(paid_at));
        assert_eq!(s.payment_method.as_deref(), Some("card"));
    }

    #[test]
    fn paid_is_terminal() {
        let mut s = pending(Utc::now());
        s.mark_paid("txn_01", None, Utc::now()).unwrap();

        assert!(s.begin_checkout("txn_02").is_err());
        assert!(s.mark_failed().is_err());
        assert!(s.mark_overdue().is_err());
        assert!(s.mark_paid("txn_03", None, Utc::now()).is_err());
    }

    #[test]
    fn failed_only_from_processing() {
        let mut s = pending(Utc::now());
        assert_eq!(
            s.mark_failed(),
            Err(CoreError::InvalidTransition {
                from: StatementStatus::Pending,
                to: StatementStatus::Failed,
            })
        );

        s.begin_checkout("txn_1").unwrap();
        s.mark_failed().unwrap();
        // Retry after a failure.
        s.begin_checkout("txn_2").unwrap();
        assert_eq!(s.transaction_id.as_deref(), Some("txn_2"));
    }

    #[test]
    fn overdue_can_still_be_paid() {
        let mut s = pending(Utc::now());
        s.mark_overdue().unwrap();
        s.begin_checkout("txn_late").unwrap();
        assert_eq!(s.status, StatementStatus::Processing);
    }

    #[test]
    fn billing_period_bounds() {
        let p = BillingPeriod::new(2, 2028).unwrap();
        assert_eq!(p.first_day(), NaiveDate::from_ymd_opt(2028, 2, 1).unwrap());
        assert_eq!(p.end_exclusive(), NaiveDate::from_ymd_opt(2028, 3, 1).unwrap());
        assert!(BillingPeriod::new(13, 2028).is_err());
        assert!(BillingPeriod::new(0, 2028).is_err());
    }

    #[test]
    fn previous_period_wraps_year() {
        let jan = NaiveDate::from_ymd_opt(2027, 1, 3).unwrap();
        assert_eq!(BillingPeriod::previous(jan), BillingPeriod { month: 12, year: 2026 });
    }
}

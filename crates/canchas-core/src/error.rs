//! Error types for canchas domain rules.

use crate::ids::IdError;
use crate::statement::StatementStatus;

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by domain rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Hour outside `0..=23` or not parseable.
    #[error("invalid hour: {0}")]
    InvalidHour(String),

    /// Date not in `YYYY-MM-DD` form.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Month outside `1..=12` or year out of range.
    #[error("invalid billing period: {month}/{year}")]
    InvalidPeriod {
        /// Requested month.
        month: u32,
        /// Requested year.
        year: i32,
    },

    /// A statement cannot move between these states.
    #[error("invalid statement transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: StatementStatus,
        /// Requested status.
        to: StatementStatus,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

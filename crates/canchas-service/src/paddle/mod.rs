//! Paddle Billing integration.
//!
//! Paddle collects the monthly commission statements:
//! - A transaction is created per statement checkout (non-catalog price)
//! - The hosted checkout URL is handed to the admin
//! - Signed webhooks report `transaction.completed` and `transaction.payment_failed`

pub mod client;
pub mod types;

pub use client::{PaddleClient, PaddleError};
pub use types::*;

//! Outgoing email.
//!
//! Booking notifications go through a [`Mailer`]. In production this is an
//! HTTP mail API ([`HttpMailer`]); without one configured the service falls
//! back to [`LogMailer`], which only records the message in the logs.

pub mod client;
pub mod templates;

pub use client::{HttpMailer, LogMailer, MailError, Mailer};

/// A single outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

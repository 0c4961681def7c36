//! Canchas HTTP API Service.
//!
//! This crate provides the HTTP API for the canchas field booking
//! marketplace, including:
//!
//! - Field catalogue, availability and admin management
//! - The booking reservation flow with email notifications
//! - Monthly commission statements paid through Paddle
//! - Paddle webhooks and the overdue sweep
//!
//! # Authentication
//!
//! 1. **Session JWTs** (HS256) - end users; admins additionally need
//!    `profiles.role = admin`
//! 2. **Service API key** - scheduled job endpoints
//! 3. **Webhook signatures** - Paddle notifications

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod mail;
pub mod paddle;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::{ApiError, FunctionError};
pub use mail::{Email, MailError, Mailer};
pub use paddle::{PaddleClient, PaddleError};
pub use routes::create_router;
pub use state::AppState;

//! API handlers.

use serde::Serialize;

pub mod bookings;
pub mod emails;
pub mod favorites;
pub mod fields;
pub mod health;
pub mod jobs;
pub mod profiles;
pub mod statements;
pub mod webhooks;

/// Body of endpoints that only acknowledge.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    /// Always `true`.
    pub ok: bool,
}

impl OkResponse {
    /// The acknowledgement.
    pub const OK: Self = Self { ok: true };
}

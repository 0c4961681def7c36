//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use canchas_core::CoreError;
use canchas_store::StoreError;

/// Message returned when the requested slot already has an active booking.
pub const SLOT_UNAVAILABLE: &str = "Horario no disponible";

/// Message returned when the field is not accepting bookings.
pub const FIELD_UNAVAILABLE: &str = "Cancha no disponible";

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - slot taken, duplicate record or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show to clients. Internal details are masked.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Unauthorized | Self::Forbidden => self.to_string(),
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::ExternalService(msg) => msg.clone(),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                "An internal error occurred".to_string()
            }
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal_error",
            Self::ExternalService(_) => "external_service_error",
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.public_message(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Error rendered as `{"ok": false, "error": "..."}`.
///
/// Used by the function-style endpoints whose clients read the `ok` flag.
#[derive(Debug)]
pub struct FunctionError(pub ApiError);

impl From<ApiError> for FunctionError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for FunctionError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl From<CoreError> for FunctionError {
    fn from(err: CoreError) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Serialize)]
struct FunctionErrorBody {
    ok: bool,
    error: String,
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = FunctionErrorBody {
            ok: false,
            error: self.0.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::SlotTaken => Self::Conflict(SLOT_UNAVAILABLE.into()),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            CoreError::InvalidHour(_)
            | CoreError::InvalidDate(_)
            | CoreError::InvalidPeriod { .. }
            | CoreError::InvalidId(_) => Self::BadRequest(err.to_string()),
        }
    }
}

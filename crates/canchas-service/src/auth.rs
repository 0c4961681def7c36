//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthUser` - End-user session via HS256 JWT access token
//! - `AdminAuth` - Session whose profile has the `admin` role
//! - `ServiceAuth` - Cron and service-to-service requests via API key

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use canchas_core::{Profile, UserId};

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;

/// An authenticated user extracted from a session token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// Email claim, when the provider includes it.
    pub email: Option<String>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract the Bearer token
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let claims = validate_jwt(token, state)?;

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            email: claims.email.filter(|e| !e.trim().is_empty()),
        })
    }
}

impl AuthUser {
    /// Email claim, or 400 when the session carries none.
    pub fn require_email(&self) -> Result<&str, ApiError> {
        self.email
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Session has no email".into()))
    }
}

/// An authenticated administrator.
///
/// Requires a valid session and a profile with `role = admin`.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// The session.
    pub user: AuthUser,
    /// The admin's profile.
    pub profile: Profile,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let profile = state
            .store
            .get_profile(&user.user_id)
            .await?
            .ok_or(ApiError::Forbidden)?;

        if !profile.is_admin() {
            tracing::debug!(user_id = %user.user_id, "Non-admin denied admin endpoint");
            return Err(ApiError::Forbidden);
        }

        tracing::info!(admin_id = %user.user_id, "Admin authenticated");

        Ok(AdminAuth { user, profile })
    }
}

/// Service authentication via API key.
///
/// Used by the scheduled job endpoints.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// The service name or identifier.
    pub service_name: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Check for X-API-Key header
        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // Validate against configured service API key
        let expected_key = state
            .config
            .service_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if !constant_time_eq(api_key, expected_key) {
            return Err(ApiError::Unauthorized);
        }

        let service_name = parts
            .headers
            .get("x-service-name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(ServiceAuth { service_name })
    }
}

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Audience (can be string or array).
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    /// Expiration time.
    pub exp: i64,
    /// Email of the signed-in user.
    #[serde(default)]
    pub email: Option<String>,
}

/// Validate an HS256 session token.
fn validate_jwt(token: &str, state: &AppState) -> Result<JwtClaims, ApiError> {
    let secret = &state.config.auth_jwt_secret;
    if secret.is_empty() {
        tracing::warn!("Rejecting session: AUTH_JWT_SECRET not configured");
        return Err(ApiError::Unauthorized);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[&state.config.auth_audience]);

    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    Ok(token_data.claims)
}

//! Profile handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use canchas_core::{Profile, UserId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Load the user's profile, creating a `user` profile on first access.
pub(crate) async fn ensure_profile(state: &AppState, user_id: UserId) -> Result<Profile, ApiError> {
    if let Some(profile) = state.store.get_profile(&user_id).await? {
        return Ok(profile);
    }

    let profile = Profile::new(user_id);
    state.store.put_profile(&profile).await?;
    tracing::info!(user_id = %user_id, "Profile created");
    Ok(profile)
}

/// Get the current user's profile.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(ensure_profile(&state, user.user_id).await?))
}

/// Editable profile fields. Empty strings clear a value; the role is not editable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

/// Update the current user's profile.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let mut profile = ensure_profile(&state, user.user_id).await?;

    let clean = |v: String| Some(v.trim().to_string()).filter(|s| !s.is_empty());
    if let Some(first_name) = request.first_name {
        profile.first_name = clean(first_name);
    }
    if let Some(last_name) = request.last_name {
        profile.last_name = clean(last_name);
    }
    if let Some(phone) = request.phone {
        profile.phone = clean(phone);
    }
    profile.updated_at = Utc::now();

    state.store.put_profile(&profile).await?;
    Ok(Json(profile))
}

//! Favorite field handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use canchas_core::{Favorite, FavoriteId, FieldId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::fields::{load_field, FieldResponse};
use crate::handlers::profiles::ensure_profile;
use crate::handlers::OkResponse;
use crate::state::AppState;

/// A favorite with its field.
#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    /// Favorite ID.
    pub id: FavoriteId,
    /// When it was added.
    pub created_at: DateTime<Utc>,
    /// The bookmarked field.
    pub field: FieldResponse,
}

/// List the current user's favorites, newest first.
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<FavoriteResponse>>, ApiError> {
    let favorites = state.store.list_favorites(&user.user_id).await?;

    let mut response = Vec::with_capacity(favorites.len());
    for favorite in favorites {
        // Fields may be removed out from under a favorite
        if let Some(field) = state.store.get_field(&favorite.field_id).await? {
            response.push(FavoriteResponse {
                id: favorite.id,
                created_at: favorite.created_at,
                field: field.into(),
            });
        }
    }

    Ok(Json(response))
}

/// Request to bookmark a field.
#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    /// Field to bookmark.
    pub field_id: String,
}

/// Bookmark a field.
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteResponse>), ApiError> {
    let field = load_field(&state, &request.field_id).await?;
    ensure_profile(&state, user.user_id).await?;

    let favorite = Favorite::new(user.user_id, field.id);
    state.store.add_favorite(&favorite).await.map_err(|e| match e {
        canchas_store::StoreError::Conflict(_) => {
            ApiError::Conflict("field is already a favorite".into())
        }
        other => other.into(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(FavoriteResponse {
            id: favorite.id,
            created_at: favorite.created_at,
            field: field.into(),
        }),
    ))
}

/// Remove a bookmark.
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(field_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let field_id: FieldId = field_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid field id: {field_id}")))?;
    state.store.remove_favorite(&user.user_id, &field_id).await?;
    Ok(Json(OkResponse::OK))
}

//! Health check and public configuration handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "canchas".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Values the frontend needs at startup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfigResponse {
    /// Public URL of the web app.
    pub app_url: String,
    /// Map tiles token, if configured.
    pub map_token: Option<String>,
}

/// Public configuration endpoint.
pub async fn public_config(State(state): State<Arc<AppState>>) -> Json<PublicConfigResponse> {
    Json(PublicConfigResponse {
        app_url: state.config.public_app_url.clone(),
        map_token: state.config.map_token.clone(),
    })
}

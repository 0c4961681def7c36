//! Canchas Service - HTTP API for the field booking marketplace
//!
//! This is the main entry point for the canchas service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canchas_service::{create_router, jobs, AppState, ServiceConfig};
use canchas_store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,canchas=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Canchas Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_configured = %config.database_url.is_some(),
        paddle_configured = %config.paddle_api_key.is_some(),
        mail_configured = %config.mail_api_url.is_some(),
        "Service configuration loaded"
    );

    // Initialize store
    let store: Arc<dyn Store> = if let Some(url) = &config.database_url {
        let store = PgStore::connect(url, config.database_max_connections).await?;
        store.migrate().await?;
        Arc::new(store)
    } else {
        tracing::warn!("DATABASE_URL not set - using in-memory store, data will not persist");
        Arc::new(MemoryStore::new())
    };

    // Build app state
    let state = AppState::new(store, config.clone());

    if let Some(secs) = config.overdue_sweep_interval_seconds {
        let _sweeper = jobs::spawn_overdue_sweeper(Arc::new(state.clone()), Duration::from_secs(secs));
    }

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Application state.

use std::sync::Arc;

use canchas_store::Store;

use crate::config::ServiceConfig;
use crate::mail::{HttpMailer, LogMailer, Mailer};
use crate::paddle::PaddleClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Paddle client for statement checkouts (optional).
    pub paddle: Option<Arc<PaddleClient>>,

    /// Outgoing mail.
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        // Create Paddle client if configured
        let paddle = config.paddle_api_key.as_ref().and_then(|key| {
            match PaddleClient::new(&config.paddle_api_url, key) {
                Ok(client) => {
                    tracing::info!(paddle_url = %config.paddle_api_url, "Paddle integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Paddle client");
                    None
                }
            }
        });

        if paddle.is_none() {
            tracing::warn!("Paddle not configured - statement checkouts will not be available");
        }

        if config.paddle_webhook_secret.is_none() {
            tracing::warn!("Paddle webhook secret not configured - webhooks will be rejected");
        }

        // Create mailer, falling back to logging
        let mailer: Arc<dyn Mailer> = match (&config.mail_api_url, &config.mail_api_key) {
            (Some(url), Some(key)) => match HttpMailer::new(url, key, &config.mail_from) {
                Ok(mailer) => {
                    tracing::info!(mail_url = %url, "Mail API enabled");
                    Arc::new(mailer)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create mail client");
                    Arc::new(LogMailer)
                }
            },
            _ => {
                tracing::warn!("Mail API not configured - emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        Self {
            store,
            config,
            paddle,
            mailer,
        }
    }

    /// Replace the mailer.
    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}

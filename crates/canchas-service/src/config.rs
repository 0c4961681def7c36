//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,

    /// Maximum database pool connections (default: 10).
    pub database_max_connections: u32,

    /// HS256 secret used to sign session tokens.
    pub auth_jwt_secret: String,

    /// Expected JWT audience (default: "authenticated").
    pub auth_audience: String,

    /// Service API key for cron-triggered job endpoints.
    pub service_api_key: Option<String>,

    /// Paddle API base URL (default: `<https://api.paddle.com>`).
    pub paddle_api_url: String,

    /// Paddle API key (optional).
    pub paddle_api_key: Option<String>,

    /// Paddle webhook secret (optional; webhooks are rejected without it).
    pub paddle_webhook_secret: Option<String>,

    /// Maximum accepted age of a webhook signature timestamp. Disabled when `None`.
    pub paddle_webhook_tolerance_seconds: Option<u64>,

    /// Currency for commission checkouts (default: "USD").
    pub paddle_currency: String,

    /// Mail API endpoint (optional; emails are logged when unset).
    pub mail_api_url: Option<String>,

    /// Mail API key.
    pub mail_api_key: Option<String>,

    /// Sender address for outgoing emails.
    pub mail_from: String,

    /// Platform administrator address notified of every booking.
    pub admin_email: Option<String>,

    /// Public URL of the web app, used for checkout redirects.
    pub public_app_url: String,

    /// Public map token handed to the frontend.
    pub map_token: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// First bookable hour of the day (default: 8).
    pub opening_hour: u8,

    /// Hour the fields close; the last bookable slot starts one hour earlier (default: 23).
    pub closing_hour: u8,

    /// Platform commission charged per booking, in cents.
    pub commission_per_booking_cents: i64,

    /// Days after the end of the billed month until a statement is due.
    pub statement_due_days: u32,

    /// Run the overdue sweep in-process at this interval. Disabled when `None`.
    pub overdue_sweep_interval_seconds: Option<u64>,
}

/// Paddle secrets file structure.
#[derive(Debug, Deserialize)]
struct PaddleSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Try to load Paddle secrets from file first, then fall back to env vars
        let (paddle_api_key, paddle_webhook_secret, paddle_api_url) = load_paddle_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            database_url: std::env::var("DATABASE_URL").ok(),
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            auth_jwt_secret: std::env::var("AUTH_JWT_SECRET").unwrap_or_else(|_| {
                tracing::warn!("AUTH_JWT_SECRET not set - all authenticated requests will fail");
                String::new()
            }),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or(defaults.auth_audience),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            paddle_api_url: paddle_api_url
                .or_else(|| std::env::var("PADDLE_API_URL").ok())
                .unwrap_or(defaults.paddle_api_url),
            paddle_api_key,
            paddle_webhook_secret,
            paddle_webhook_tolerance_seconds: env_parse("PADDLE_WEBHOOK_TOLERANCE_SECONDS"),
            paddle_currency: std::env::var("PADDLE_CURRENCY").unwrap_or(defaults.paddle_currency),
            mail_api_url: std::env::var("MAIL_API_URL").ok(),
            mail_api_key: std::env::var("MAIL_API_KEY").ok(),
            mail_from: std::env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.trim().is_empty()),
            public_app_url: std::env::var("PUBLIC_APP_URL").unwrap_or(defaults.public_app_url),
            map_token: std::env::var("MAP_TOKEN").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            opening_hour: env_parse("OPENING_HOUR").unwrap_or(defaults.opening_hour),
            closing_hour: env_parse("CLOSING_HOUR").unwrap_or(defaults.closing_hour),
            commission_per_booking_cents: env_parse("COMMISSION_PER_BOOKING_CENTS")
                .unwrap_or(defaults.commission_per_booking_cents),
            statement_due_days: env_parse("STATEMENT_DUE_DAYS")
                .unwrap_or(defaults.statement_due_days),
            overdue_sweep_interval_seconds: env_parse("OVERDUE_SWEEP_INTERVAL_SECONDS"),
        }
    }

    /// Hours that can be booked on any day, in order.
    #[must_use]
    pub fn bookable_hours(&self) -> std::ops::Range<u8> {
        self.opening_hour..self.closing_hour.min(24)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Load Paddle secrets from file or environment.
fn load_paddle_secrets() -> (Option<String>, Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/paddle.json",
        "canchas/.secrets/paddle.json",
        "../.secrets/paddle.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<PaddleSecrets>(path) {
            tracing::info!(path = %path, "Loaded Paddle secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret, secrets.api_url);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Paddle secrets file not found, using environment variables");
    (
        std::env::var("PADDLE_API_KEY").ok(),
        std::env::var("PADDLE_WEBHOOK_SECRET").ok(),
        None,
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: None,
            database_max_connections: 10,
            auth_jwt_secret: String::new(),
            auth_audience: "authenticated".into(),
            service_api_key: None,
            paddle_api_url: "https://api.paddle.com".into(),
            paddle_api_key: None,
            paddle_webhook_secret: None,
            paddle_webhook_tolerance_seconds: None,
            paddle_currency: "USD".into(),
            mail_api_url: None,
            mail_api_key: None,
            mail_from: "Canchas <reservas@canchas.app>".into(),
            admin_email: None,
            public_app_url: "http://localhost:3000".into(),
            map_token: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            opening_hour: 8,
            closing_hour: 23,
            commission_per_booking_cents: 500,
            statement_due_days: 10,
            overdue_sweep_interval_seconds: None,
        }
    }
}

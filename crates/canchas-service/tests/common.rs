//! Common test utilities for canchas integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use canchas_core::{Field, Profile, Role, UserId};
use canchas_service::auth::JwtClaims;
use canchas_service::crypto::hmac_sha256_hex;
use canchas_service::{create_router, AppState, Email, MailError, Mailer, ServiceConfig};
use canchas_store::{MemoryStore, Store};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const SERVICE_API_KEY: &str = "test-service-key";
pub const WEBHOOK_SECRET: &str = "pdl_ntfset_test_secret";
pub const ADMIN_EMAIL: &str = "admin@canchas.test";

/// Mailer that records every message, optionally failing each send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        let mut to: Vec<String> = self.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect();
        to.sort();
        to
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(MailError::Api {
                status: 503,
                body: "mail provider down".into(),
            });
        }
        Ok(())
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the store for seeding and assertions.
    pub store: Arc<MemoryStore>,
    /// Every email the service tried to send.
    pub mailer: Arc<RecordingMailer>,
    /// The application state behind the server.
    pub state: AppState,
    /// A regular user.
    pub test_user_id: UserId,
    /// The regular user's email.
    pub test_user_email: String,
}

impl TestHarness {
    /// Create a new test harness with an empty store.
    pub fn new() -> Self {
        Self::build(|_| {}, RecordingMailer::default())
    }

    /// Create a harness with adjusted configuration.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        Self::build(adjust, RecordingMailer::default())
    }

    /// Create a harness whose mailer fails every send.
    pub fn with_failing_mailer() -> Self {
        Self::build(|_| {}, RecordingMailer::failing())
    }

    fn build(adjust: impl FnOnce(&mut ServiceConfig), mailer: RecordingMailer) -> Self {
        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            auth_jwt_secret: JWT_SECRET.into(),
            service_api_key: Some(SERVICE_API_KEY.into()),
            paddle_webhook_secret: Some(WEBHOOK_SECRET.into()),
            admin_email: Some(ADMIN_EMAIL.into()),
            public_app_url: "http://localhost:3000".into(),
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(mailer);
        let state = AppState::new(store.clone(), config).with_mailer(mailer.clone());

        let router: Router = create_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            mailer,
            state,
            test_user_id: UserId::generate(),
            test_user_email: "jugador@example.com".into(),
        }
    }

    /// Mint a session token.
    pub fn token_for(user_id: UserId, email: Option<&str>) -> String {
        let claims = JwtClaims {
            sub: user_id.to_string(),
            aud: Some(serde_json::json!("authenticated")),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            email: email.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode JWT")
    }

    /// Authorization header for the regular test user.
    pub fn user_auth_header(&self) -> String {
        format!(
            "Bearer {}",
            Self::token_for(self.test_user_id, Some(&self.test_user_email))
        )
    }

    /// Authorization header for a fresh admin, seeding its profile.
    pub async fn admin_auth_header(&self) -> String {
        let admin_id = UserId::generate();
        let mut profile = Profile::new(admin_id);
        profile.role = Role::Admin;
        self.store.put_profile(&profile).await.unwrap();
        format!("Bearer {}", Self::token_for(admin_id, Some(ADMIN_EMAIL)))
    }

    /// Insert an active field.
    pub async fn seed_field(&self, name: &str, location: Option<&str>) -> Field {
        let mut field = Field::new(name, 12_000);
        field.location = location.map(str::to_string);
        field.owner_email = Some("duenio@example.com".into());
        self.store.put_field(&field).await.unwrap();
        field
    }

    /// Sign a webhook body the way Paddle does.
    pub fn paddle_signature(body: &str) -> String {
        let ts = Utc::now().timestamp();
        format!(
            "ts={ts};h1={}",
            hmac_sha256_hex(WEBHOOK_SECRET, &format!("{ts}:{body}"))
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

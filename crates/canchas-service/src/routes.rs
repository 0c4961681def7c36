//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    bookings, emails, favorites, fields, health, jobs, profiles, statements, webhooks,
};
use crate::state::AppState;

/// Maximum concurrent requests for public and session endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for admin endpoints.
const ADMIN_MAX_CONCURRENT_REQUESTS: usize = 20;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /api/public-config` - Frontend configuration
/// - `GET /api/home-fields` - Active fields grouped by location
/// - `GET /api/fields`, `GET /api/fields/:id`, `GET /api/fields/:id/availability`
/// - `POST /functions/v1/create-booking` - Reserve a slot
///
/// ## Session (JWT)
/// - `GET /api/bookings/me`, `POST /api/bookings/:id/cancel`
/// - `GET|POST /api/favorites`, `DELETE /api/favorites/:field_id`
/// - `GET|PATCH /api/profile`
/// - `POST /api/send-booking-email`
///
/// ## Admin (JWT + admin role)
/// - `GET|POST /api/admin/fields`, `PATCH /api/admin/fields/:id`
/// - `GET /api/admin/bookings` - Calendar
/// - `GET /api/admin/statements`, `POST /api/admin/statements/generate`
/// - `POST /api/paddle/create-checkout`
///
/// ## Webhooks (signature verification)
/// - `POST /api/paddle/webhook`
///
/// ## Jobs (service API key)
/// - `POST /internal/jobs/overdue-sweep`
/// - `POST /internal/jobs/monthly-statements`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let admin_routes = Router::new()
        .route(
            "/fields",
            get(fields::admin_list_fields).post(fields::admin_create_field),
        )
        .route("/fields/:id", axum::routing::patch(fields::admin_update_field))
        .route("/bookings", get(bookings::admin_list_bookings))
        .route("/statements", get(statements::admin_list_statements))
        .route(
            "/statements/generate",
            post(statements::admin_generate_statements),
        )
        .layer(ConcurrencyLimitLayer::new(ADMIN_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Catalogue
        .route("/public-config", get(health::public_config))
        .route("/home-fields", get(fields::home_fields))
        .route("/fields", get(fields::list_fields))
        .route("/fields/:id", get(fields::get_field))
        .route("/fields/:id/availability", get(fields::availability))
        // Bookings
        .route("/bookings/me", get(bookings::my_bookings))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/send-booking-email", post(emails::send_booking_email))
        // Favorites
        .route(
            "/favorites",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route(
            "/favorites/:field_id",
            axum::routing::delete(favorites::remove_favorite),
        )
        // Profile
        .route(
            "/profile",
            get(profiles::get_profile).patch(profiles::update_profile),
        )
        // Payments
        .route("/paddle/create-checkout", post(statements::create_checkout))
        .nest("/admin", admin_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    let job_routes = Router::new()
        .route("/overdue-sweep", post(jobs::overdue_sweep))
        .route("/monthly-statements", post(jobs::monthly_statements));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/api", api_routes)
        .route(
            "/functions/v1/create-booking",
            post(bookings::create_booking),
        )
        // Webhooks (no rate limit - controlled by Paddle)
        .route("/api/paddle/webhook", post(webhooks::paddle_webhook))
        .nest("/internal/jobs", job_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

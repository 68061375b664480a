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

use crate::handlers::{client_config, health, payments, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for payment endpoints.
const PAYMENT_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /config` - Publishable key for Stripe.js
///
/// ## Payment intents (concurrency-limited)
/// - `POST /create-payment-intent` - Create a payment intent
/// - `POST /confirm-payment-intent` - Confirm a payment intent
/// - `GET /payment-intent-status/:id` - Current status of a payment intent
///
/// ## Webhooks (signature verification)
/// - `POST /webhook` - Stripe webhooks
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Every payment call fans out to Stripe; cap how many are in flight.
    let payment_routes = Router::new()
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent),
        )
        .route(
            "/confirm-payment-intent",
            post(payments::confirm_payment_intent),
        )
        .route(
            "/payment-intent-status/:payment_intent_id",
            get(payments::payment_intent_status),
        )
        .layer(ConcurrencyLimitLayer::new(PAYMENT_MAX_CONCURRENT_REQUESTS));

    Router::new()
        .route("/health", get(health::health))
        .route("/config", get(client_config::client_config))
        .merge(payment_routes)
        // Webhooks (no concurrency limit - Stripe controls delivery rate)
        .route("/webhook", post(webhooks::stripe_webhook))
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

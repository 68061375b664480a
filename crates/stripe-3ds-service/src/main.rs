//! Stripe 3DS Service - payment intent relay for 3-D Secure card flows
//!
//! This is the main entry point for the relay service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stripe_3ds_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stripe_3ds=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Stripe 3DS Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        stripe_configured = %config.stripe_secret_key.is_some(),
        publishable_key_configured = %config.stripe_publishable_key.is_some(),
        webhook_secret_configured = %config.stripe_webhook_secret.is_some(),
        three_d_secure = %config.three_d_secure,
        "Service configuration loaded"
    );

    // Build app state
    let state = AppState::new(config.clone())?;

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Application state.

use std::sync::Arc;

use crate::accessor::IntentAccessor;
use crate::config::ServiceConfig;
use crate::events::{LoggingEventHandler, PaymentEventHandler};
use crate::relay::SessionRelay;
use crate::stripe::{StripeClient, StripeClientOptions, StripeError};
use crate::webhook::{WebhookDispatcher, WebhookVerifier};

/// Application state shared across handlers.
///
/// Everything here is immutable after startup.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// The relay the handlers delegate to.
    pub relay: SessionRelay,
}

impl AppState {
    /// Build state backed by the real Stripe client and the logging event
    /// handler.
    ///
    /// A missing secret key is only warned about: the service still starts,
    /// and every Stripe call is rejected upstream with an authentication
    /// error, relayed as a 400.
    pub fn new(config: ServiceConfig) -> Result<Self, StripeError> {
        if config.stripe_secret_key.is_none() {
            tracing::warn!("STRIPE_SECRET_KEY not set - Stripe will reject every payment call");
        }

        let stripe = StripeClient::with_options(
            config.stripe_secret_key.clone().unwrap_or_default(),
            StripeClientOptions {
                base_url: config.stripe_api_base.clone(),
                timeout_seconds: config.stripe_timeout_seconds,
                three_d_secure: config.three_d_secure,
            },
        )?;
        tracing::info!(
            api_base = %config.stripe_api_base,
            three_d_secure = %config.three_d_secure,
            "Stripe integration enabled"
        );

        Ok(Self::with_components(
            config,
            Arc::new(stripe),
            Arc::new(LoggingEventHandler),
        ))
    }

    /// Build state from explicit components (custom handlers, test stubs).
    #[must_use]
    pub fn with_components(
        config: ServiceConfig,
        accessor: Arc<dyn IntentAccessor>,
        handler: Arc<dyn PaymentEventHandler>,
    ) -> Self {
        let verifier = WebhookVerifier::new(
            config.stripe_webhook_secret.clone(),
            config.webhook_tolerance_seconds,
        );
        if !verifier.is_configured() {
            tracing::warn!("STRIPE_WEBHOOK_SECRET not set - all webhook deliveries will be rejected");
        }

        let relay = SessionRelay::new(accessor, WebhookDispatcher::new(verifier, handler));

        Self { config, relay }
    }
}

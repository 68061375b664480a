//! Stripe API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use stripe_3ds_core::{CreateIntentParams, PaymentIntent, RelayError};

use super::types::{StripeErrorResponse, ThreeDSecureMode};
use crate::accessor::IntentAccessor;

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error ({status}): {error_type} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
        /// Card decline code.
        decline_code: Option<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StripeError {
    /// Whether Stripe reported that the object does not exist.
    #[must_use]
    pub fn is_resource_missing(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
            || matches!(self, Self::Api { code: Some(code), .. } if code == "resource_missing")
    }

    /// Whether Stripe refused the call because of the intent's current state.
    #[must_use]
    pub fn is_unexpected_state(&self) -> bool {
        matches!(self, Self::Api { code: Some(code), .. } if code == "payment_intent_unexpected_state")
    }

    /// Classify into the relay taxonomy. `intent_id` is the ID the call was
    /// about, used to report `NotFound`.
    #[must_use]
    pub fn into_relay(self, intent_id: Option<&str>) -> RelayError {
        if let Some(id) = intent_id {
            if self.is_resource_missing() {
                return RelayError::NotFound { id: id.to_string() };
            }
        }

        match self {
            Self::Http(e) if e.is_decode() => {
                RelayError::Internal(format!("unexpected Stripe response: {e}"))
            }
            Self::Http(e) => RelayError::Transport(e.to_string()),
            Self::Api {
                message,
                code,
                decline_code,
                ..
            } => RelayError::Processor {
                message,
                code,
                decline_code,
            },
            Self::Configuration(msg) => RelayError::Internal(msg),
        }
    }
}

/// Options for [`StripeClient`].
#[derive(Debug, Clone)]
pub struct StripeClientOptions {
    /// API base URL (overridable for tests).
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// 3-D Secure request mode for created intents.
    pub three_d_secure: ThreeDSecureMode,
}

impl Default for StripeClientOptions {
    fn default() -> Self {
        Self {
            base_url: StripeClient::BASE_URL.to_string(),
            timeout_seconds: 30,
            three_d_secure: ThreeDSecureMode::default(),
        }
    }
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
    three_d_secure: ThreeDSecureMode,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.base_url)
            .field("three_d_secure", &self.three_d_secure)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Stripe API base URL.
    pub const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client with default options.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    pub fn new(api_key: impl Into<String>) -> Result<Self, StripeError> {
        Self::with_options(api_key, StripeClientOptions::default())
    }

    /// Create a new Stripe client with custom options.
    pub fn with_options(
        api_key: impl Into<String>,
        options: StripeClientOptions,
    ) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| StripeError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: options.base_url.trim_end_matches('/').to_string(),
            three_d_secure: options.three_d_secure,
        })
    }

    /// Create a payment intent.
    ///
    /// Confirmation is manual: the frontend (or `confirm_payment_intent`)
    /// confirms after the customer has supplied a payment method, which is
    /// where any 3-D Secure challenge happens.
    pub async fn create_payment_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, StripeError> {
        let mut form = vec![
            ("amount".to_string(), params.amount().to_string()),
            ("currency".to_string(), params.currency().to_string()),
            ("confirmation_method".to_string(), "manual".to_string()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                "payment_method_options[card][request_three_d_secure]".to_string(),
                self.three_d_secure.to_string(),
            ),
        ];
        form.extend(
            params
                .metadata()
                .iter()
                .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
        );

        tracing::debug!(
            amount = params.amount(),
            currency = %params.currency(),
            three_d_secure = %self.three_d_secure,
            "Creating Stripe payment intent"
        );

        let mut request = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&form);

        if let Some(key) = params.idempotency_key() {
            request = request.header("Idempotency-Key", key);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Get a single payment intent by ID.
    pub async fn get_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<PaymentIntent, StripeError> {
        let response = self
            .client
            .get(format!(
                "{}/payment_intents/{}",
                self.base_url, payment_intent_id
            ))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Confirm a payment intent.
    pub async fn confirm_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<PaymentIntent, StripeError> {
        let response = self
            .client
            .post(format!(
                "{}/payment_intents/{}/confirm",
                self.base_url, payment_intent_id
            ))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                status: status.as_u16(),
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
                decline_code: stripe_error.error.decline_code,
            }),
            Err(_) => Err(StripeError::Api {
                status: status.as_u16(),
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
                decline_code: None,
            }),
        }
    }
}

#[async_trait]
impl IntentAccessor for StripeClient {
    async fn create(&self, params: &CreateIntentParams) -> Result<PaymentIntent, RelayError> {
        self.create_payment_intent(params)
            .await
            .map_err(|e| e.into_relay(None))
    }

    async fn retrieve(&self, id: &str) -> Result<PaymentIntent, RelayError> {
        self.get_payment_intent(id)
            .await
            .map_err(|e| e.into_relay(Some(id)))
    }

    async fn confirm(&self, id: &str) -> Result<PaymentIntent, RelayError> {
        let current = self.retrieve(id).await?;
        if current.status.is_confirmed() {
            tracing::debug!(
                payment_intent_id = %id,
                status = %current.status,
                "Payment intent already confirmed, returning current state"
            );
            return Ok(current);
        }

        match self.confirm_payment_intent(id).await {
            Ok(confirmed) => Ok(confirmed),
            // Someone else confirmed between our read and our confirm.
            Err(err) if err.is_unexpected_state() => {
                let latest = self.retrieve(id).await?;
                if latest.status.is_confirmed() {
                    Ok(latest)
                } else {
                    Err(err.into_relay(Some(id)))
                }
            }
            Err(err) => Err(err.into_relay(Some(id))),
        }
    }
}

//! Session relay service.
//!
//! Maps the four public operations onto the accessor and the webhook
//! dispatcher and shapes their results into the response contract. It makes
//! no payment decisions and keeps no state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stripe_3ds_core::{
    CreateIntentParams, IntentStatus, LastPaymentError, Metadata, PaymentIntent, RelayError,
};

use crate::accessor::IntentAccessor;
use crate::webhook::{DispatchOutcome, WebhookDispatcher};

/// Amount used when the create request omits one ($5.00).
pub const DEFAULT_AMOUNT: i64 = 500;

/// Currency used when the create request omits one.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Longest payment intent ID accepted from callers.
const MAX_INTENT_ID_LEN: usize = 255;

/// Create payment intent request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateIntentRequest {
    /// Amount in minor units (default: 500).
    #[serde(default)]
    pub amount: Option<i64>,
    /// Currency code (default: `usd`).
    #[serde(default)]
    pub currency: Option<String>,
    /// Customer email, stored as metadata.
    #[serde(default)]
    pub email: Option<String>,
    /// Customer name, stored as metadata.
    #[serde(default)]
    pub name: Option<String>,
    /// Extra metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Idempotency key forwarded to Stripe.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl CreateIntentRequest {
    /// Validate into accessor parameters.
    ///
    /// # Errors
    ///
    /// `RelayError::InvalidRequest` for a non-positive amount, bad currency
    /// or oversized metadata.
    pub fn into_params(self) -> Result<CreateIntentParams, RelayError> {
        let mut metadata = self.metadata;
        for (key, value) in [("email", self.email), ("name", self.name)] {
            if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                metadata.insert(key.to_string(), value);
            }
        }

        let params = CreateIntentParams::new(
            self.amount.unwrap_or(DEFAULT_AMOUNT),
            self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
            metadata,
        )?;

        Ok(match self.idempotency_key {
            Some(key) => params.with_idempotency_key(key),
            None => params,
        })
    }
}

/// Create payment intent response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateIntentResponse {
    /// Token the frontend passes to Stripe.js.
    pub client_secret: String,
    /// Payment intent ID.
    pub payment_intent_id: String,
    /// Status reported by Stripe.
    pub status: IntentStatus,
}

/// Confirm payment intent request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmIntentRequest {
    /// Payment intent ID.
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Confirm payment intent response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmIntentResponse {
    /// Status after confirmation.
    pub status: IntentStatus,
    /// Payment intent ID.
    pub payment_intent_id: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Currency.
    pub currency: String,
}

/// Payment intent status response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentStatusResponse {
    /// Current status.
    pub status: IntentStatus,
    /// Amount in minor units.
    pub amount: i64,
    /// Currency.
    pub currency: String,
    /// Created timestamp (Unix).
    pub created: i64,
    /// Last payment error, `null` if none.
    pub last_payment_error: Option<LastPaymentError>,
    /// Pending customer action (3-D Secure challenge descriptor).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<serde_json::Value>,
}

impl From<PaymentIntent> for IntentStatusResponse {
    fn from(pi: PaymentIntent) -> Self {
        Self {
            status: pi.status,
            amount: pi.amount,
            currency: pi.currency,
            created: pi.created,
            last_payment_error: pi.last_payment_error,
            next_action: pi.next_action,
        }
    }
}

/// Webhook acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    /// Always `"success"`.
    pub status: String,
}

impl WebhookAck {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// Request/response facade over the accessor and the dispatcher.
#[derive(Clone)]
pub struct SessionRelay {
    accessor: Arc<dyn IntentAccessor>,
    dispatcher: WebhookDispatcher,
}

impl std::fmt::Debug for SessionRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRelay")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl SessionRelay {
    /// Create a relay.
    #[must_use]
    pub fn new(accessor: Arc<dyn IntentAccessor>, dispatcher: WebhookDispatcher) -> Self {
        Self {
            accessor,
            dispatcher,
        }
    }

    /// Create a payment intent. Input is validated before Stripe is called.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for bad input; accessor errors otherwise.
    pub async fn create_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<CreateIntentResponse, RelayError> {
        let params = request.into_params().inspect_err(|e| {
            tracing::warn!(error = %e, "Rejected create payment intent request");
        })?;

        let intent = self
            .accessor
            .create(&params)
            .await
            .inspect_err(|e| log_failure("create", None, e))?;

        let client_secret = intent.client_secret.clone().ok_or_else(|| {
            RelayError::Internal(format!(
                "Stripe returned payment intent {} without a client_secret",
                intent.id
            ))
        })?;

        tracing::info!(
            payment_intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            status = %intent.status,
            "Payment intent created"
        );

        Ok(CreateIntentResponse {
            client_secret,
            payment_intent_id: intent.id,
            status: intent.status,
        })
    }

    /// Confirm a payment intent. Confirming an already-confirmed intent
    /// reports its current status.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a missing ID; accessor errors otherwise.
    pub async fn confirm_intent(
        &self,
        request: ConfirmIntentRequest,
    ) -> Result<ConfirmIntentResponse, RelayError> {
        let id = request
            .payment_intent_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RelayError::invalid_request("Payment intent ID is required"))?;
        validate_intent_id(&id)?;

        let intent = self
            .accessor
            .confirm(&id)
            .await
            .inspect_err(|e| log_failure("confirm", Some(&id), e))?;

        tracing::info!(
            payment_intent_id = %intent.id,
            status = %intent.status,
            next_action = intent.next_action_type().unwrap_or("none"),
            "Payment intent confirmed"
        );

        Ok(ConfirmIntentResponse {
            status: intent.status,
            payment_intent_id: intent.id,
            amount: intent.amount,
            currency: intent.currency,
        })
    }

    /// Current status of a payment intent, straight from Stripe.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a malformed ID, `NotFound` for an unknown one.
    pub async fn get_status(&self, id: &str) -> Result<IntentStatusResponse, RelayError> {
        validate_intent_id(id)?;

        let intent = self
            .accessor
            .retrieve(id)
            .await
            .inspect_err(|e| log_failure("status", Some(id), e))?;

        tracing::debug!(
            payment_intent_id = %intent.id,
            status = %intent.status,
            created_at = ?intent.created_at(),
            "Payment intent status retrieved"
        );

        Ok(intent.into())
    }

    /// Verify and dispatch a webhook delivery.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` or `MalformedPayload`; handler failures never
    /// surface here.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookAck, RelayError> {
        let signature = signature.ok_or(RelayError::InvalidSignature).inspect_err(|_| {
            tracing::warn!("Webhook delivery without Stripe-Signature header");
        })?;

        let outcome = self
            .dispatcher
            .dispatch(payload, signature)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Rejected Stripe webhook"))?;

        if let DispatchOutcome::Ignored(kind) = &outcome {
            tracing::debug!(event_kind = %kind, "Acknowledged unhandled webhook event");
        }

        Ok(WebhookAck::success())
    }
}

/// Intent IDs end up in Stripe URL paths, so only `[A-Za-z0-9_]` is allowed.
fn validate_intent_id(id: &str) -> Result<(), RelayError> {
    if id.is_empty()
        || id.len() > MAX_INTENT_ID_LEN
        || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return Err(RelayError::invalid_request(format!(
            "Invalid payment intent ID: '{id}'"
        )));
    }
    Ok(())
}

fn log_failure(operation: &str, payment_intent_id: Option<&str>, err: &RelayError) {
    if err.is_client_error() {
        tracing::warn!(
            operation,
            payment_intent_id = ?payment_intent_id,
            error = %err,
            "Stripe rejected payment intent operation"
        );
    } else {
        tracing::error!(
            operation,
            payment_intent_id = ?payment_intent_id,
            error = %err,
            "Payment intent operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults() {
        let params = CreateIntentRequest::default().into_params().unwrap();
        assert_eq!(params.amount(), DEFAULT_AMOUNT);
        assert_eq!(params.currency().as_str(), DEFAULT_CURRENCY);
        assert!(params.metadata().is_empty());
        assert!(params.idempotency_key().is_none());
    }

    #[test]
    fn create_request_folds_email_and_name_into_metadata() {
        let request = CreateIntentRequest {
            amount: Some(1200),
            currency: Some("EUR".into()),
            email: Some("jane@example.com".into()),
            name: Some("  ".into()),
            metadata: [("order_id".to_string(), "ord_7".to_string())].into(),
            idempotency_key: Some("ord_7-create".into()),
        };
        let params = request.into_params().unwrap();
        assert_eq!(params.currency().as_str(), "eur");
        assert_eq!(
            params.metadata().get("email").map(String::as_str),
            Some("jane@example.com")
        );
        assert!(!params.metadata().contains_key("name"));
        assert_eq!(params.metadata().get("order_id").map(String::as_str), Some("ord_7"));
        assert_eq!(params.idempotency_key(), Some("ord_7-create"));
    }

    #[test]
    fn intent_id_validation() {
        assert!(validate_intent_id("pi_3S4w67DOVUu6yhjN1a1ZfBjx").is_ok());
        assert!(validate_intent_id("").is_err());
        assert!(validate_intent_id("pi_1/confirm").is_err());
        assert!(validate_intent_id("pi_1?expand=x").is_err());
        assert!(validate_intent_id(&"a".repeat(MAX_INTENT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn status_response_serializes_null_error_and_omits_missing_action() {
        let pi: PaymentIntent = serde_json::from_value(serde_json::json!({
            "id": "pi_1",
            "amount": 500,
            "currency": "usd",
            "status": "processing",
            "created": 1_700_000_000
        }))
        .unwrap();

        let body = serde_json::to_value(IntentStatusResponse::from(pi)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "status": "processing",
                "amount": 500,
                "currency": "usd",
                "created": 1_700_000_000,
                "last_payment_error": null
            })
        );
    }
}

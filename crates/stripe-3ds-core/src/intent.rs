//! Payment intent types.
//!
//! A `PaymentIntent` is always the processor's representation. The relay
//! deserializes it, reads it, and hands it back out; it never edits one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::RelayError;

/// Caller-supplied metadata, opaque to the relay.
pub type Metadata = BTreeMap<String, String>;

/// Maximum number of metadata keys the processor accepts.
pub const MAX_METADATA_KEYS: usize = 50;

/// Maximum metadata key length (characters).
pub const MAX_METADATA_KEY_LEN: usize = 40;

/// Maximum metadata value length (characters).
pub const MAX_METADATA_VALUE_LEN: usize = 500;

/// Status of a payment intent, as reported by the processor.
///
/// Observed lifecycle:
/// `requires_payment_method -> requires_confirmation -> requires_action* ->
/// processing -> {succeeded | canceled}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IntentStatus {
    /// No payment method attached yet.
    RequiresPaymentMethod,
    /// Payment method attached, waiting for confirmation.
    RequiresConfirmation,
    /// Customer action (e.g. a 3-D Secure challenge) is required.
    RequiresAction,
    /// The processor is working on it.
    Processing,
    /// Authorized, waiting for manual capture.
    RequiresCapture,
    /// Funds moved.
    Succeeded,
    /// Canceled; terminal.
    Canceled,
    /// A status this build does not know about, relayed verbatim.
    Unknown(String),
}

impl IntentStatus {
    /// The processor's wire name for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Succeeded => "succeeded",
            Self::Canceled => "canceled",
            Self::Unknown(s) => s,
        }
    }

    /// Confirmation has already happened (or can no longer happen), so a
    /// confirm request should just report the current state.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(
            self,
            Self::Processing | Self::RequiresCapture | Self::Succeeded | Self::Canceled
        )
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for IntentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_action" => Self::RequiresAction,
            "processing" => Self::Processing,
            "requires_capture" => Self::RequiresCapture,
            "succeeded" => Self::Succeeded,
            "canceled" => Self::Canceled,
            _ => Self::Unknown(value),
        }
    }
}

impl From<IntentStatus> for String {
    fn from(status: IntentStatus) -> Self {
        match status {
            IntentStatus::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

/// The last error the processor recorded against an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPaymentError {
    /// Error type (e.g. `card_error`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Error code (e.g. `card_declined`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Card decline code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decline_code: Option<String>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Request parameter that caused the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// A processor-tracked payment intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Processor-assigned ID (`pi_...`).
    pub id: String,
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: i64,
    /// Currency code, as returned by the processor.
    #[serde(default)]
    pub currency: String,
    /// Current status.
    pub status: IntentStatus,
    /// Token the frontend uses to confirm the intent.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Last recorded payment error.
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
    /// Next action the customer must take (3-D Secure challenge etc.).
    #[serde(default)]
    pub next_action: Option<serde_json::Value>,
    /// Metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl PaymentIntent {
    /// Creation time, if the timestamp is representable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// The `type` of the pending next action, if any
    /// (e.g. `use_stripe_sdk`, `redirect_to_url`).
    #[must_use]
    pub fn next_action_type(&self) -> Option<&str> {
        self.next_action
            .as_ref()
            .and_then(|a| a.get("type"))
            .and_then(serde_json::Value::as_str)
    }

    /// Message of the last payment error, if any.
    #[must_use]
    pub fn last_error_message(&self) -> Option<&str> {
        self.last_payment_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
    }
}

/// Validated parameters for creating a payment intent.
///
/// The only way to build one is [`CreateIntentParams::new`], so an accessor
/// can never be handed a non-positive amount or an unsupported currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntentParams {
    amount: i64,
    currency: Currency,
    metadata: Metadata,
    idempotency_key: Option<String>,
}

impl CreateIntentParams {
    /// Validate and build creation parameters.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::InvalidRequest` if the amount is not positive,
    /// the currency is malformed or unsupported, or the metadata exceeds the
    /// processor's limits.
    pub fn new(amount: i64, currency: &str, metadata: Metadata) -> Result<Self, RelayError> {
        if amount <= 0 {
            return Err(RelayError::invalid_request(format!(
                "amount must be a positive integer, got {amount}"
            )));
        }

        let currency: Currency = currency
            .parse()
            .map_err(|e: crate::CurrencyError| RelayError::invalid_request(e.to_string()))?;

        validate_metadata(&metadata)?;

        Ok(Self {
            amount,
            currency,
            metadata,
            idempotency_key: None,
        })
    }

    /// Attach an idempotency key forwarded to the processor.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.idempotency_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Amount in minor currency units (always positive).
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.amount
    }

    /// Currency.
    #[must_use]
    pub const fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Idempotency key, if the caller supplied one.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }
}

fn validate_metadata(metadata: &Metadata) -> Result<(), RelayError> {
    if metadata.len() > MAX_METADATA_KEYS {
        return Err(RelayError::invalid_request(format!(
            "metadata may have at most {MAX_METADATA_KEYS} keys"
        )));
    }

    for (key, value) in metadata {
        if key.is_empty() || key.chars().count() > MAX_METADATA_KEY_LEN {
            return Err(RelayError::invalid_request(format!(
                "metadata key '{key}' must be 1-{MAX_METADATA_KEY_LEN} characters"
            )));
        }
        if value.chars().count() > MAX_METADATA_VALUE_LEN {
            return Err(RelayError::invalid_request(format!(
                "metadata value for '{key}' exceeds {MAX_METADATA_VALUE_LEN} characters"
            )));
        }
    }

    Ok(())
}

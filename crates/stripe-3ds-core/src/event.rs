//! Webhook event envelope.

use std::fmt;

use serde::Deserialize;

use crate::error::RelayError;
use crate::intent::PaymentIntent;

/// Kind of a webhook event.
///
/// The processor adds kinds over time, so anything not listed here is kept
/// as `Other` and ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum EventKind {
    /// `payment_intent.succeeded`
    PaymentSucceeded,
    /// `payment_intent.payment_failed`
    PaymentFailed,
    /// `payment_intent.requires_action`
    RequiresAction,
    /// Any other kind.
    Other(String),
}

impl EventKind {
    /// Wire name of the event kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentSucceeded => "payment_intent.succeeded",
            Self::PaymentFailed => "payment_intent.payment_failed",
            Self::RequiresAction => "payment_intent.requires_action",
            Self::Other(s) => s,
        }
    }

    /// Whether a handler exists for this kind.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "payment_intent.succeeded" => Self::PaymentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentFailed,
            "payment_intent.requires_action" => Self::RequiresAction,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified webhook event.
///
/// Constructed per delivery and never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID (`evt_...`).
    pub id: String,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Event data.
    pub data: WebhookEventData,
}

/// Webhook event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// The event object.
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Parse an event envelope from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::MalformedPayload` if the bytes are not an
    /// `{id, type, data: {object}}` envelope.
    pub fn from_slice(payload: &[u8]) -> Result<Self, RelayError> {
        serde_json::from_slice(payload).map_err(|e| RelayError::MalformedPayload(e.to_string()))
    }

    /// Decode the event object as a payment intent snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::MalformedPayload` if the object is not a payment
    /// intent.
    pub fn payment_intent(&self) -> Result<PaymentIntent, RelayError> {
        PaymentIntent::deserialize(&self.data.object).map_err(|e| {
            RelayError::MalformedPayload(format!("event {} object: {e}", self.id))
        })
    }
}

//! Payment event handlers.
//!
//! Business reactions to webhook events (emails, order updates,
//! fulfillment) live behind [`PaymentEventHandler`], injected into the
//! dispatcher at construction. The dispatcher treats every hook as
//! best-effort: errors and panics are logged and never reach the webhook
//! acknowledgment.
//!
//! Delivery is at-least-once and unordered, so hooks must tolerate
//! duplicate and out-of-order calls for the same intent.

use async_trait::async_trait;

use stripe_3ds_core::PaymentIntent;

/// Error a handler may report. Logged by the dispatcher, never propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Hooks invoked for payment intent webhook events.
#[async_trait]
pub trait PaymentEventHandler: Send + Sync {
    /// `payment_intent.succeeded`
    async fn on_succeeded(&self, intent: &PaymentIntent) -> Result<(), HandlerError>;

    /// `payment_intent.payment_failed`
    async fn on_failed(&self, intent: &PaymentIntent) -> Result<(), HandlerError>;

    /// `payment_intent.requires_action` (typically a 3-D Secure challenge).
    async fn on_requires_action(&self, intent: &PaymentIntent) -> Result<(), HandlerError>;
}

/// Default handler: logs each event and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventHandler;

#[async_trait]
impl PaymentEventHandler for LoggingEventHandler {
    async fn on_succeeded(&self, intent: &PaymentIntent) -> Result<(), HandlerError> {
        tracing::info!(
            payment_intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            "Payment succeeded"
        );
        Ok(())
    }

    async fn on_failed(&self, intent: &PaymentIntent) -> Result<(), HandlerError> {
        tracing::warn!(
            payment_intent_id = %intent.id,
            error = intent.last_error_message().unwrap_or("Unknown error"),
            decline_code = ?intent.last_payment_error.as_ref().and_then(|e| e.decline_code.as_deref()),
            "Payment failed"
        );
        Ok(())
    }

    async fn on_requires_action(&self, intent: &PaymentIntent) -> Result<(), HandlerError> {
        tracing::info!(
            payment_intent_id = %intent.id,
            next_action = intent.next_action_type().unwrap_or("none"),
            "Payment requires 3D Secure authentication"
        );
        Ok(())
    }
}

//! Routes verified webhook events to the payment event handler.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use stripe_3ds_core::{EventKind, PaymentIntent, RelayError};

use super::verifier::WebhookVerifier;
use crate::events::{HandlerError, PaymentEventHandler};

/// What happened to a verified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A hook was invoked for this kind.
    Handled(EventKind),
    /// Kind has no hook; accepted and dropped.
    Ignored(EventKind),
}

/// Verifies a delivery and invokes at most one handler hook for it.
///
/// Single pass, no queue, no replay protection: a redelivered event runs its
/// hook again.
#[derive(Clone)]
pub struct WebhookDispatcher {
    verifier: WebhookVerifier,
    handler: Arc<dyn PaymentEventHandler>,
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl WebhookDispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(verifier: WebhookVerifier, handler: Arc<dyn PaymentEventHandler>) -> Self {
        Self { verifier, handler }
    }

    /// Verify `payload` against `signature` and dispatch it.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - verification failed
    /// - `MalformedPayload` - not an event envelope, or a payment intent
    ///   event whose object is not a payment intent
    ///
    /// Handler failures are never returned.
    pub async fn dispatch(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<DispatchOutcome, RelayError> {
        let event = self.verifier.verify(payload, signature)?;

        if !event.kind.is_known() {
            tracing::debug!(
                event_id = %event.id,
                event_kind = %event.kind,
                "Unhandled Stripe event"
            );
            return Ok(DispatchOutcome::Ignored(event.kind));
        }

        let intent = event.payment_intent().inspect_err(|e| {
            tracing::warn!(
                event_id = %event.id,
                event_kind = %event.kind,
                error = %e,
                "Payment intent event without a payment intent object"
            );
        })?;

        tracing::info!(
            event_id = %event.id,
            event_kind = %event.kind,
            payment_intent_id = %intent.id,
            status = %intent.status,
            "Received Stripe webhook"
        );

        self.invoke(&event.kind, &intent).await;

        Ok(DispatchOutcome::Handled(event.kind))
    }

    /// Run the hook for `kind`, containing errors and panics.
    async fn invoke(&self, kind: &EventKind, intent: &PaymentIntent) {
        let handler = &self.handler;
        let hook = async {
            match kind {
                EventKind::PaymentSucceeded => handler.on_succeeded(intent).await,
                EventKind::PaymentFailed => handler.on_failed(intent).await,
                EventKind::RequiresAction => handler.on_requires_action(intent).await,
                EventKind::Other(_) => Ok::<(), HandlerError>(()),
            }
        };

        match AssertUnwindSafe(hook).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(
                    event_kind = %kind,
                    payment_intent_id = %intent.id,
                    error = %e,
                    "Payment event handler failed"
                );
            }
            Err(_) => {
                tracing::error!(
                    event_kind = %kind,
                    payment_intent_id = %intent.id,
                    "Payment event handler panicked"
                );
            }
        }
    }
}

//! Intent store accessor port.
//!
//! The relay talks to the processor only through this trait, so tests can
//! substitute a stub and count invocations.

use async_trait::async_trait;

use stripe_3ds_core::{CreateIntentParams, PaymentIntent, RelayError};

/// Create, retrieve and confirm payment intents at the processor.
///
/// Implementations never retry; transient failures surface as
/// `RelayError::Transport`.
#[async_trait]
pub trait IntentAccessor: Send + Sync {
    /// Create a payment intent.
    ///
    /// Returns the processor's representation, normally in a non-terminal
    /// status and carrying a `client_secret`.
    async fn create(&self, params: &CreateIntentParams) -> Result<PaymentIntent, RelayError>;

    /// Retrieve a payment intent by ID.
    ///
    /// Fails with `RelayError::NotFound` if the processor does not know it.
    async fn retrieve(&self, id: &str) -> Result<PaymentIntent, RelayError>;

    /// Confirm a payment intent.
    ///
    /// Idempotent from the caller's side: confirming an intent that is
    /// already confirmed returns its current representation.
    async fn confirm(&self, id: &str) -> Result<PaymentIntent, RelayError>;
}

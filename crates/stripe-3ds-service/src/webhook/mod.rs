//! Webhook verification and dispatch.

pub mod dispatcher;
pub mod verifier;

pub use dispatcher::{DispatchOutcome, WebhookDispatcher};
pub use verifier::{sign_payload, SignatureHeader, WebhookVerifier, DEFAULT_TOLERANCE_SECS};

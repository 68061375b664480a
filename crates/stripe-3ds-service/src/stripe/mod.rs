//! Stripe integration for payment intents.
//!
//! Stripe handles:
//! - Payment intent creation and confirmation
//! - 3-D Secure challenges (opaque to us, surfaced as `next_action`)
//! - Webhook delivery for payment events

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeClientOptions, StripeError};
pub use types::*;

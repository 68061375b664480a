//! Core types for the Stripe 3-D Secure relay.
//!
//! This crate provides the foundational types shared by the relay service:
//!
//! - **Intents**: `PaymentIntent`, `IntentStatus`, `LastPaymentError`
//! - **Requests**: `CreateIntentParams`, `Currency`
//! - **Webhooks**: `WebhookEvent`, `EventKind`
//! - **Errors**: `RelayError`
//!
//! # Amounts
//!
//! Amounts are always integers in the currency's minor unit
//! (500 = $5.00 for `usd`). The processor owns every status transition;
//! nothing in this crate changes an intent's status.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod currency;
pub mod error;
pub mod event;
pub mod intent;

pub use currency::{Currency, CurrencyError, SUPPORTED_CURRENCIES};
pub use error::{RelayError, Result};
pub use event::{EventKind, WebhookEvent, WebhookEventData};
pub use intent::{CreateIntentParams, IntentStatus, LastPaymentError, Metadata, PaymentIntent};

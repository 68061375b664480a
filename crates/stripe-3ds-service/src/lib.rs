//! Stripe 3-D Secure relay service.
//!
//! A thin HTTP backend in front of Stripe's payment intent API:
//!
//! - Payment intent creation, confirmation and status
//! - Stripe webhook verification and dispatch to event handlers
//! - Frontend configuration (publishable key)
//!
//! Stripe owns every payment decision, including whether and how a 3-D
//! Secure challenge happens. This service relays opaque values
//! (`client_secret`, `next_action`) and maps failures to HTTP status codes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for Axum

pub mod accessor;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod handlers;
pub mod relay;
pub mod routes;
pub mod state;
pub mod stripe;
pub mod webhook;

pub use accessor::IntentAccessor;
pub use config::ServiceConfig;
pub use error::ApiError;
pub use events::{HandlerError, LoggingEventHandler, PaymentEventHandler};
pub use relay::SessionRelay;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeClientOptions, StripeError};
pub use webhook::{WebhookDispatcher, WebhookVerifier};

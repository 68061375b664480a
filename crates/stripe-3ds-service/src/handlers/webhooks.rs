//! Stripe webhook handler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::error::ApiError;
use crate::relay::WebhookAck;
use crate::state::AppState;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Handle Stripe webhooks.
///
/// The raw body is verified byte-for-byte, so it must not be parsed or
/// re-serialized before verification.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let ack = state.relay.handle_webhook(&body, signature).await?;
    Ok(Json(ack))
}

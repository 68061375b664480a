//! Frontend configuration handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Values the frontend needs to drive Stripe.js (and its 3DS challenge).
#[derive(Debug, Serialize)]
pub struct ClientConfigResponse {
    /// Stripe publishable key, `null` when not configured.
    pub publishable_key: Option<String>,
}

/// Expose the publishable key.
pub async fn client_config(State(state): State<Arc<AppState>>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        publishable_key: state.config.stripe_publishable_key.clone(),
    })
}

//! Payment intent handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiError;
use crate::relay::{
    ConfirmIntentRequest, ConfirmIntentResponse, CreateIntentRequest, CreateIntentResponse,
    IntentStatusResponse,
};
use crate::state::AppState;

/// Create a payment intent for a 3-D Secure capable card flow.
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateIntentRequest>, JsonRejection>,
) -> Result<Json<CreateIntentResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.relay.create_intent(request).await?;
    Ok(Json(response))
}

/// Confirm a payment intent after the customer completed authentication.
pub async fn confirm_payment_intent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfirmIntentRequest>, JsonRejection>,
) -> Result<Json<ConfirmIntentResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.relay.confirm_intent(request).await?;
    Ok(Json(response))
}

/// Current status of a payment intent.
pub async fn payment_intent_status(
    State(state): State<Arc<AppState>>,
    Path(payment_intent_id): Path<String>,
) -> Result<Json<IntentStatusResponse>, ApiError> {
    let response = state.relay.get_status(&payment_intent_id).await?;
    Ok(Json(response))
}

//! API error types and responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use stripe_3ds_core::RelayError;

/// Message returned for every 5xx; details stay in the logs.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request - invalid input, unknown intent, rejected webhook, or a
    /// Stripe-side rejection.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error (transport failures included).
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        match err {
            // Unknown intents stay 400 to keep the existing client contract.
            RelayError::InvalidRequest(_)
            | RelayError::NotFound { .. }
            | RelayError::InvalidSignature
            | RelayError::MalformedPayload(_)
            | RelayError::Processor { .. } => Self::BadRequest(err.to_string()),
            RelayError::Transport(_) | RelayError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

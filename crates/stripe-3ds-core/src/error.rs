//! Error types for the relay.

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors that can occur while relaying payment operations.
///
/// The variants form the taxonomy the HTTP layer maps onto status codes:
/// everything except `Transport` and `Internal` is a caller-visible 4xx.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Malformed caller input (non-positive amount, unsupported currency, ...).
    #[error("{0}")]
    InvalidRequest(String),

    /// The processor does not know this payment intent.
    #[error("No such payment_intent: '{id}'")]
    NotFound {
        /// The intent ID that was not found.
        id: String,
    },

    /// Webhook signature did not match the payload.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook payload could not be parsed as an event envelope.
    #[error("Invalid payload: {0}")]
    MalformedPayload(String),

    /// The processor rejected the operation (e.g. card declined).
    #[error("{message}")]
    Processor {
        /// Processor message, relayed verbatim.
        message: String,
        /// Processor error code, if any.
        code: Option<String>,
        /// Card decline code, if any.
        decline_code: Option<String>,
    },

    /// Network failure or timeout talking to the processor.
    #[error("transport error: {0}")]
    Transport(String),

    /// Unclassified internal fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Create an `InvalidRequest` error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Whether this error is the caller's (or the processor's verdict on the
    /// caller's request) rather than a fault of the relay itself.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Transport(_) | Self::Internal(_))
    }
}

//! Stripe API types.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Card decline code.
    #[serde(default)]
    pub decline_code: Option<String>,
    /// Parameter that caused the error.
    #[serde(default)]
    pub param: Option<String>,
}

/// How eagerly Stripe should request a 3-D Secure challenge for card payments
/// (`payment_method_options[card][request_three_d_secure]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreeDSecureMode {
    /// Let Stripe and the issuer decide.
    #[default]
    Automatic,
    /// Request 3DS whenever the card supports it.
    Any,
    /// Require a challenge whenever the card supports it.
    Challenge,
}

impl ThreeDSecureMode {
    /// Stripe's wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Any => "any",
            Self::Challenge => "challenge",
        }
    }
}

impl fmt::Display for ThreeDSecureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreeDSecureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "automatic" => Ok(Self::Automatic),
            "any" => Ok(Self::Any),
            "challenge" => Ok(Self::Challenge),
            other => Err(format!(
                "unknown 3DS mode '{other}' (expected automatic, any or challenge)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_d_secure_mode_parses() {
        assert_eq!("ANY".parse::<ThreeDSecureMode>(), Ok(ThreeDSecureMode::Any));
        assert_eq!(" challenge ".parse::<ThreeDSecureMode>(), Ok(ThreeDSecureMode::Challenge));
        assert_eq!("automatic".parse::<ThreeDSecureMode>(), Ok(ThreeDSecureMode::Automatic));
        assert!("always".parse::<ThreeDSecureMode>().is_err());
    }

    #[test]
    fn error_response_deserializes() {
        let body = serde_json::json!({
            "error": {
                "type": "card_error",
                "code": "card_declined",
                "decline_code": "generic_decline",
                "message": "Your card was declined."
            }
        });
        let parsed: StripeErrorResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.error.error_type, "card_error");
        assert_eq!(parsed.error.decline_code.as_deref(), Some("generic_decline"));
        assert!(parsed.error.param.is_none());
    }
}

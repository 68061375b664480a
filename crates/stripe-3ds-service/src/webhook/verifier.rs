//! Stripe webhook signature verification.
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 using the
//! endpoint's signing secret and sends it as
//! `Stripe-Signature: t=<timestamp>,v1=<hex>[,v1=<hex>...]`. Several `v1`
//! entries appear while a secret is being rolled.

use stripe_3ds_core::{RelayError, WebhookEvent};

use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// Default tolerance between the signed timestamp and now (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Parsed `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
    /// Signed timestamp, exactly as sent.
    pub timestamp: &'a str,
    /// Candidate `v1` signatures (hex).
    pub signatures: Vec<&'a str>,
}

impl<'a> SignatureHeader<'a> {
    /// Parse a header. Unknown keys (e.g. legacy `v0`) are ignored.
    ///
    /// # Errors
    ///
    /// `RelayError::InvalidSignature` if the timestamp or every `v1` is
    /// missing.
    pub fn parse(header: &'a str) -> Result<Self, RelayError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", ts)) => timestamp = Some(ts),
                Some(("v1", sig)) if !sig.is_empty() => signatures.push(sig),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(RelayError::InvalidSignature)?;
        if signatures.is_empty() {
            return Err(RelayError::InvalidSignature);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifies signed webhook payloads against a shared secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("configured", &self.secret.is_some())
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    /// Create a verifier.
    ///
    /// Without a secret every delivery is rejected; verification is never
    /// skipped.
    #[must_use]
    pub fn new(secret: Option<String>, tolerance_secs: i64) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            tolerance_secs,
        }
    }

    /// Whether a signing secret is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify against the current time and parse the event.
    ///
    /// # Errors
    ///
    /// See [`WebhookVerifier::verify_at`].
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<WebhookEvent, RelayError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// Verify against an explicit `now` (Unix seconds) and parse the event.
    ///
    /// The signature is checked before the payload is looked at, so a bad
    /// signature is always reported as such whatever the body contains.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - no secret, unparseable header, no matching
    ///   `v1`, or timestamp outside the tolerance
    /// - `MalformedPayload` - signature valid but body is not an event
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<WebhookEvent, RelayError> {
        let secret = self.secret.as_deref().ok_or(RelayError::InvalidSignature)?;
        let header = SignatureHeader::parse(header)?;

        let expected = hmac_sha256_hex(secret, &[header.timestamp.as_bytes(), b".", payload]);
        if !header
            .signatures
            .iter()
            .any(|sig| constant_time_eq(&expected, sig))
        {
            return Err(RelayError::InvalidSignature);
        }

        let timestamp: i64 = header
            .timestamp
            .parse()
            .map_err(|_| RelayError::InvalidSignature)?;
        if now.abs_diff(timestamp) > self.tolerance_secs.unsigned_abs() {
            tracing::warn!(
                timestamp,
                now,
                tolerance_secs = self.tolerance_secs,
                "Webhook timestamp outside tolerance"
            );
            return Err(RelayError::InvalidSignature);
        }

        WebhookEvent::from_slice(payload)
    }
}

/// Build a `Stripe-Signature` header for `payload` (test fixtures, local
/// tooling).
#[must_use]
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let ts = timestamp.to_string();
    let sig = hmac_sha256_hex(secret, &[ts.as_bytes(), b".", payload]);
    format!("t={ts},v1={sig}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1_700_000_000;
    const PAYLOAD: &[u8] =
        br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1","status":"succeeded"}}}"#;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(Some(SECRET.into()), DEFAULT_TOLERANCE_SECS)
    }

    #[test]
    fn header_parsing() {
        let header = SignatureHeader::parse("t=123,v1=abc,v0=legacy,v1=def").unwrap();
        assert_eq!(header.timestamp, "123");
        assert_eq!(header.signatures, vec!["abc", "def"]);

        assert!(SignatureHeader::parse("v1=abc").is_err());
        assert!(SignatureHeader::parse("t=123").is_err());
        assert!(SignatureHeader::parse("t=123,v1=").is_err());
        assert!(SignatureHeader::parse("").is_err());
        assert!(SignatureHeader::parse("garbage").is_err());
    }

    #[test]
    fn valid_signature_parses_event() {
        let header = sign_payload(SECRET, NOW, PAYLOAD);
        let event = verifier().verify_at(PAYLOAD, &header, NOW).unwrap();
        assert_eq!(event.id, "evt_1");
    }

    #[test]
    fn any_matching_v1_is_accepted() {
        let good = sign_payload(SECRET, NOW, PAYLOAD);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1={},v1={good_sig}", "0".repeat(64));
        assert!(verifier().verify_at(PAYLOAD, &header, NOW).is_ok());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let mut header = sign_payload(SECRET, NOW, PAYLOAD);
        let last = header.pop().unwrap();
        header.push(if last == '0' { '1' } else { '0' });

        assert!(matches!(
            verifier().verify_at(PAYLOAD, &header, NOW),
            Err(RelayError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_signature_wins_over_malformed_payload() {
        let header = sign_payload("whsec_other", NOW, b"not json");
        assert!(matches!(
            verifier().verify_at(b"not json", &header, NOW),
            Err(RelayError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = sign_payload(SECRET, NOW, PAYLOAD);
        let tampered = String::from_utf8_lossy(PAYLOAD).replace("pi_1", "pi_2");
        assert!(matches!(
            verifier().verify_at(tampered.as_bytes(), &header, NOW),
            Err(RelayError::InvalidSignature)
        ));
    }

    #[test]
    fn timestamp_outside_tolerance_is_rejected() {
        let header = sign_payload(SECRET, NOW, PAYLOAD);
        let v = verifier();
        assert!(v.verify_at(PAYLOAD, &header, NOW + DEFAULT_TOLERANCE_SECS).is_ok());
        assert!(matches!(
            v.verify_at(PAYLOAD, &header, NOW + DEFAULT_TOLERANCE_SECS + 1),
            Err(RelayError::InvalidSignature)
        ));
        assert!(matches!(
            v.verify_at(PAYLOAD, &header, NOW - DEFAULT_TOLERANCE_SECS - 1),
            Err(RelayError::InvalidSignature)
        ));
    }

    #[test]
    fn extreme_timestamps_are_rejected() {
        let v = verifier();
        for ts in [i64::MIN, i64::MAX] {
            let header = sign_payload(SECRET, ts, PAYLOAD);
            assert!(matches!(
                v.verify_at(PAYLOAD, &header, NOW),
                Err(RelayError::InvalidSignature)
            ));
        }

        let header = sign_payload(SECRET, NOW, PAYLOAD);
        assert!(matches!(
            v.verify_at(PAYLOAD, &header, i64::MIN),
            Err(RelayError::InvalidSignature)
        ));
    }

    #[test]
    fn valid_signature_over_garbage_is_malformed() {
        let header = sign_payload(SECRET, NOW, b"{\"hello\":");
        assert!(matches!(
            verifier().verify_at(b"{\"hello\":", &header, NOW),
            Err(RelayError::MalformedPayload(_))
        ));
    }

    #[test]
    fn missing_secret_rejects_everything() {
        let v = WebhookVerifier::new(None, DEFAULT_TOLERANCE_SECS);
        assert!(!v.is_configured());
        let header = sign_payload(SECRET, NOW, PAYLOAD);
        assert!(matches!(
            v.verify_at(PAYLOAD, &header, NOW),
            Err(RelayError::InvalidSignature)
        ));

        assert!(!WebhookVerifier::new(Some(String::new()), 300).is_configured());
    }
}

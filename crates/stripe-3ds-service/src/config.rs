//! Service configuration.

use std::path::Path;

use serde::Deserialize;

use crate::stripe::{StripeClient, ThreeDSecureMode};
use crate::webhook::DEFAULT_TOLERANCE_SECS;

/// Service configuration loaded from environment variables.
///
/// Built once at startup and never mutated.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:5000").
    pub listen_addr: String,

    /// Stripe secret API key.
    pub stripe_secret_key: Option<String>,

    /// Stripe publishable key, handed to the frontend.
    pub stripe_publishable_key: Option<String>,

    /// Stripe webhook signing secret.
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL.
    pub stripe_api_base: String,

    /// Timeout for calls to Stripe, in seconds.
    pub stripe_timeout_seconds: u64,

    /// Allowed webhook timestamp skew, in seconds.
    pub webhook_tolerance_seconds: i64,

    /// 3-D Secure request mode for created intents.
    pub three_d_secure: ThreeDSecureMode,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("listen_addr", &self.listen_addr)
            .field("stripe_secret_key", &redact(self.stripe_secret_key.as_ref()))
            .field("stripe_publishable_key", &self.stripe_publishable_key)
            .field(
                "stripe_webhook_secret",
                &redact(self.stripe_webhook_secret.as_ref()),
            )
            .field("stripe_api_base", &self.stripe_api_base)
            .field("stripe_timeout_seconds", &self.stripe_timeout_seconds)
            .field("webhook_tolerance_seconds", &self.webhook_tolerance_seconds)
            .field("three_d_secure", &self.three_d_secure)
            .field("cors_origins", &self.cors_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

fn redact(secret: Option<&String>) -> Option<&'static str> {
    secret.map(|_| "<redacted>")
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    publishable_key: Option<String>,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), load_stripe_secrets_file())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Values found in the secrets file win over the lookup.
    fn from_lookup(
        var: impl Fn(&str) -> Option<String>,
        secrets: Option<StripeSecrets>,
    ) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| present(var(key));

        let (stripe_secret_key, stripe_publishable_key, stripe_webhook_secret) = match secrets {
            Some(s) => (
                present(Some(s.api_key)).or_else(|| non_empty("STRIPE_SECRET_KEY")),
                present(s.publishable_key).or_else(|| non_empty("STRIPE_PUBLISHABLE_KEY")),
                present(s.webhook_secret).or_else(|| non_empty("STRIPE_WEBHOOK_SECRET")),
            ),
            None => (
                non_empty("STRIPE_SECRET_KEY"),
                non_empty("STRIPE_PUBLISHABLE_KEY"),
                non_empty("STRIPE_WEBHOOK_SECRET"),
            ),
        };

        let three_d_secure = match non_empty("THREE_D_SECURE").map(|v| v.parse::<ThreeDSecureMode>()) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Ignoring THREE_D_SECURE, using default");
                defaults.three_d_secure
            }
            None => defaults.three_d_secure,
        };

        Self {
            listen_addr: non_empty("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            stripe_secret_key,
            stripe_publishable_key,
            stripe_webhook_secret,
            stripe_api_base: non_empty("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
            stripe_timeout_seconds: parse_or(
                var("STRIPE_TIMEOUT_SECONDS"),
                defaults.stripe_timeout_seconds,
            ),
            webhook_tolerance_seconds: parse_or(
                var("WEBHOOK_TOLERANCE_SECONDS"),
                defaults.webhook_tolerance_seconds,
            ),
            three_d_secure,
            cors_origins: var("CORS_ORIGINS")
                .unwrap_or_else(|| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_body_bytes: parse_or(var("MAX_BODY_BYTES"), defaults.max_body_bytes),
            request_timeout_seconds: parse_or(
                var("REQUEST_TIMEOUT_SECONDS"),
                defaults.request_timeout_seconds,
            ),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// Load Stripe secrets from the first secrets file found.
fn load_stripe_secrets_file() -> Option<StripeSecrets> {
    let secret_paths = [
        ".secrets/stripe.json",
        "stripe-3ds/.secrets/stripe.json",
        "../.secrets/stripe.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return Some(secrets);
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    None
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".into(),
            stripe_secret_key: None,
            stripe_publishable_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: StripeClient::BASE_URL.into(),
            stripe_timeout_seconds: 30,
            webhook_tolerance_seconds: DEFAULT_TOLERANCE_SECS,
            three_d_secure: ThreeDSecureMode::Automatic,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

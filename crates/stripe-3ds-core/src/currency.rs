//! ISO 4217 currency codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies the processor accepts for card payments (lowercase ISO 4217).
pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "aed", "aud", "bgn", "brl", "cad", "chf", "cny", "czk", "dkk", "eur", "gbp", "hkd", "huf",
    "idr", "ils", "inr", "isk", "jpy", "krw", "mxn", "myr", "nok", "nzd", "php", "pln", "ron",
    "sar", "sek", "sgd", "thb", "try", "twd", "usd", "zar",
];

/// Error returned when parsing a currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyError {
    /// Not a three-letter alphabetic code.
    #[error("invalid currency code '{0}': expected 3 letters")]
    Malformed(String),

    /// Well-formed, but not one the processor accepts.
    #[error("unsupported currency '{0}'")]
    Unsupported(String),
}

/// A validated, lowercase ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// The lowercase code, as the processor expects it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CurrencyError::Malformed(s.to_string()));
        }

        let code = code.to_ascii_lowercase();
        if !SUPPORTED_CURRENCIES.contains(&code.as_str()) {
            return Err(CurrencyError::Unsupported(code));
        }

        Ok(Self(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

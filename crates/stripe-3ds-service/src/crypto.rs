//! Cryptographic utilities for webhook verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 over `parts` (concatenated) and return it hex-encoded.
///
/// # Panics
///
/// Never in practice: HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, parts: &[&[u8]]) -> String {
    // INVARIANT: `new_from_slice` only fails for fixed-key MACs; HMAC takes
    // any key length.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    for part in parts {
        mac.update(part);
    }

    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time string comparison.
///
/// Length is not secret (signatures are fixed-size hex), so unequal lengths
/// return early.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

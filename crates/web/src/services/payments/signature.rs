//! Webhook signature verification.
//!
//! Paystack signs every webhook with `x-paystack-signature`: the lowercase
//! hex HMAC-SHA512 of the raw request body keyed with the secret key.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;
use thiserror::Error;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Why a webhook signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No signature header on the request.
    #[error("missing signature")]
    Missing,

    /// Signature does not match the body.
    #[error("signature mismatch")]
    Mismatch,

    /// The secret could not key the MAC.
    #[error("invalid key: {0}")]
    Key(String),
}

/// Compute the signature Paystack would send for `body`.
///
/// # Errors
///
/// Returns `SignatureError::Key` if the MAC cannot be keyed.
pub fn sign(secret: &SecretString, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| SignatureError::Key(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` against the body. The comparison is exact, so an
/// uppercase hex signature is rejected.
///
/// # Errors
///
/// Returns `SignatureError::Missing` or `SignatureError::Mismatch`.
pub fn verify(
    secret: &SecretString,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let signature = signature
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing)?;
    let expected = sign(secret, body)?;

    if !constant_time_compare(&expected, signature) {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

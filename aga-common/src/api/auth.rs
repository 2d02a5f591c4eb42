//! Webhook request authentication
//!
//! Inbound webhooks carry `x-webhook-signature: sha256=<hex>`, an HMAC-SHA256
//! over the exact raw request body keyed with the shared webhook secret.
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions. The axum middleware that reads
//! the body and applies these checks lives in the service crate.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Required scheme prefix of the header value
pub const SIGNATURE_PREFIX: &str = "sha256=";

// ========================================
// Error Types
// ========================================

/// Webhook authentication failures. Every variant maps to 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAuthError {
    /// No shared secret is configured, so nothing can be verified
    SecretNotConfigured,

    /// Signature header absent
    MissingSignature,

    /// Header present but not `sha256=<hex>`
    InvalidFormat,

    /// Signature is not valid hex
    MalformedSignature,

    /// MAC does not match the body
    SignatureMismatch,

    /// The secret could not key the MAC
    InvalidSecret(String),
}

impl std::fmt::Display for WebhookAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookAuthError::SecretNotConfigured => write!(f, "Webhook secret not configured"),
            WebhookAuthError::MissingSignature => write!(f, "Missing X-Webhook-Signature header"),
            WebhookAuthError::InvalidFormat => {
                write!(f, "Invalid signature format. Expected: sha256=<hex>")
            }
            WebhookAuthError::MalformedSignature => write!(f, "Signature is not valid hex"),
            WebhookAuthError::SignatureMismatch => write!(f, "Invalid signature"),
            WebhookAuthError::InvalidSecret(err) => write!(f, "Invalid webhook secret: {}", err),
        }
    }
}

impl std::error::Error for WebhookAuthError {}

// ========================================
// Signature Calculation
// ========================================

fn compute_mac(secret: &str, body: &[u8]) -> Result<Vec<u8>, WebhookAuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| WebhookAuthError::InvalidSecret(err.to_string()))?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Hex HMAC-SHA256 of `body` under `secret`
pub fn generate_signature(secret: &str, body: &[u8]) -> Result<String, WebhookAuthError> {
    compute_mac(secret, body).map(hex::encode)
}

/// Full header value (`sha256=<hex>`) for `body`, as a sender would produce it
pub fn signature_header_value(secret: &str, body: &[u8]) -> Result<String, WebhookAuthError> {
    Ok(format!("{}{}", SIGNATURE_PREFIX, generate_signature(secret, body)?))
}

// ========================================
// Validation
// ========================================

/// Validate a webhook request.
///
/// `secret` is the configured shared secret (an empty secret counts as
/// unset), `body` the exact raw bytes received and `header` the value of
/// [`SIGNATURE_HEADER`]. The MAC comparison is constant time.
pub fn validate_signature(
    secret: Option<&str>,
    body: &[u8],
    header: Option<&str>,
) -> Result<(), WebhookAuthError> {
    let secret = match secret {
        Some(s) if !s.is_empty() => s,
        _ => return Err(WebhookAuthError::SecretNotConfigured),
    };

    let header = header.ok_or(WebhookAuthError::MissingSignature)?;

    let provided_hex = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(WebhookAuthError::InvalidFormat)?;

    let provided = hex::decode(provided_hex).map_err(|_| WebhookAuthError::MalformedSignature)?;
    let expected = compute_mac(secret, body)?;

    if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        Ok(())
    } else {
        Err(WebhookAuthError::SignatureMismatch)
    }
}

//! Webhook signature verification.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=...]`, where the HMAC-SHA256
//! is computed over `"{t}.{raw body}"` with the endpoint's shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Default accepted clock skew between signing and verification.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header has no timestamp")]
    MissingTimestamp,
    #[error("signature header has no v1 signatures")]
    MissingSignatures,
    #[error("no signature matches the payload")]
    NoMatch,
    #[error("timestamp {0} outside the tolerance window")]
    TimestampOutsideTolerance(i64),
}

fn mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(mac(secret, timestamp, payload).finalize().into_bytes())
}

/// Builds a complete header value for `payload`.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!("t={},v1={}", timestamp, compute_signature(secret, timestamp, payload))
}

/// Verifies `header` against the raw `payload`, returning the signed timestamp.
pub fn verify(payload: &[u8], header: &str, secret: &str, tolerance_secs: i64, now: i64) -> Result<i64, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for (key, value) in header.split(',').filter_map(|part| part.trim().split_once('=')) {
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() { return Err(SignatureError::MissingSignatures); }

    let expected = mac(secret, timestamp, payload);
    let matched = signatures.iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| expected.clone().verify_slice(&sig).is_ok());
    if !matched { return Err(SignatureError::NoMatch); }

    if (now - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::TimestampOutsideTolerance(timestamp));
    }
    Ok(timestamp)
}

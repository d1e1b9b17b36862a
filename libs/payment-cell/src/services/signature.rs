use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::models::PaymentGatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between the timestamp in the signature header and
/// the receiving host, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Builds a `t=<ts>,v1=<hex>` signature header for `payload`, the scheme the
/// checkout provider uses for webhook deliveries.
pub fn sign_payload(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let digest = mac.finalize().into_bytes();

    format!("t={},v1={}", timestamp, hex_encode(&digest))
}

/// Verifies a `t=...,v1=...` signature header against `payload`.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    signature_header: &str,
    now: i64,
) -> Result<(), PaymentGatewayError> {
    let mut timestamp: Option<i64> = None;
    let mut signature: Option<Vec<u8>> = None;

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signature = hex_decode(value),
            _ => {}
        }
    }

    let (timestamp, signature) = match (timestamp, signature) {
        (Some(t), Some(s)) => (t, s),
        _ => {
            debug!("Malformed signature header");
            return Err(PaymentGatewayError::InvalidSignature);
        }
    };

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        debug!("Signature timestamp outside tolerance window");
        return Err(PaymentGatewayError::InvalidSignature);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentGatewayError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    mac.verify_slice(&signature).map_err(|_| {
        debug!("Webhook signature mismatch");
        PaymentGatewayError::InvalidSignature
    })
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).ok())
        .collect()
}

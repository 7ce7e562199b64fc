//! Kontent webhook signature verification.
//!
//! Kontent signs the JSON body of each delivery using HMAC-SHA256 and sends the
//! base64 digest in the `x-kc-signature` header. The digest is computed over a
//! pretty-printed (2-space) rendition of the body whose line breaks are CRLF.
//! Reference: https://kontent.ai/learn/docs/webhooks/webhooks-how-to/secure-webhooks

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the presented signature.
pub const SIGNATURE_HEADER: &str = "x-kc-signature";

/// Largest magnitude at which every whole `f64` is an exact integer (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Render a delivery body into the exact text the sender signed.
///
/// Keys keep the order in which they were received. Whole-number floats are
/// written as integers (`1.0` becomes `1`), as the sender's serializer does;
/// other numbers keep serde_json's formatting.
pub fn canonicalize_payload(body: &Value) -> Result<String, serde_json::Error> {
    let pretty = serde_json::to_string_pretty(&integral_floats(body))?;
    Ok(normalize_line_endings(&pretty))
}

/// Copy of `value` with whole-number floats turned into integers.
fn integral_floats(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(integral_floats).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), integral_floats(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Replace every run of CR/LF characters with a single CRLF.
pub fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut in_break = false;

    for c in text.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push_str("\r\n");
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }

    out
}

/// Compute the base64 signature Kontent would send for `payload`.
pub fn sign_payload(payload: &str, secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify a Kontent webhook signature.
///
/// # Arguments
///
/// * `payload` - The canonicalized body (see [`canonicalize_payload`])
/// * `secret` - The webhook secret configured in Kontent
/// * `signature` - The `x-kc-signature` header value
///
/// # Returns
///
/// `true` only when every input is present and the digest matches.
pub fn verify_kontent_signature(payload: &str, secret: &str, signature: &str) -> bool {
    if secret.is_empty() || signature.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature.is_empty(),
            "kontent_signature_missing_fields"
        );
        return false;
    }

    let presented = match STANDARD.decode(signature.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "kontent_signature_not_base64");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("kontent_signature_invalid_key");
            return false;
        }
    };

    mac.update(payload.as_bytes());

    // verify_slice compares in constant time
    let valid = mac.verify_slice(&presented).is_ok();

    if !valid {
        warn!(
            payload_length = payload.len(),
            signature_length = presented.len(),
            "kontent_signature_mismatch"
        );
    }

    valid
}

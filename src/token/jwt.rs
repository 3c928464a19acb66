//! Unverified JWT payload decoding.
//!
//! The backend signs session tokens; the client only reads the payload to
//! learn when the token stops being usable. Signature verification stays on
//! the server.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Number of dot-separated segments in a JWS compact token.
const SEGMENTS: usize = 3;

/// Claims issued by the Expensio backend, as far as the client cares.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Decode the payload segment of a token without verifying its signature.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let payload = decode_payload(token)?;
    serde_json::from_value(Value::Object(payload)).map_err(|_| TokenError::InvalidPayload)
}

/// Expiry of `token` in milliseconds since the epoch.
///
/// Only `exp` is inspected, so unexpected shapes in other claims do not
/// invalidate an otherwise usable token.
pub fn decode_expiry(token: &str) -> Result<i64, TokenError> {
    let payload = decode_payload(token)?;
    let exp = payload.get("exp").ok_or(TokenError::MissingExpiry)?;

    if let Some(secs) = exp.as_i64() {
        return secs.checked_mul(1000).ok_or(TokenError::MissingExpiry);
    }
    match exp.as_f64() {
        Some(secs) if secs.is_finite() => Ok((secs * 1000.0) as i64),
        _ => Err(TokenError::MissingExpiry),
    }
}

fn decode_payload(token: &str) -> Result<Map<String, Value>, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != SEGMENTS {
        return Err(TokenError::InvalidFormat);
    }

    let payload_bytes = decode_base64url(parts[1])?;
    match serde_json::from_slice(&payload_bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(TokenError::InvalidPayload),
    }
}

/// Translate base64url to standard base64, restore padding, and decode.
fn decode_base64url(segment: &str) -> Result<Vec<u8>, TokenError> {
    let mut standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    match standard.len() % 4 {
        0 => {}
        2 => standard.push_str("=="),
        3 => standard.push('='),
        // A single leftover character can never encode a whole byte.
        _ => return Err(TokenError::InvalidEncoding),
    }

    STANDARD
        .decode(standard.as_bytes())
        .map_err(|_| TokenError::InvalidEncoding)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid JWT format")]
    InvalidFormat,

    #[error("Invalid base64url encoding in token payload")]
    InvalidEncoding,

    #[error("Token payload is not a JSON object")]
    InvalidPayload,

    #[error("Token payload has no numeric exp claim")]
    MissingExpiry,
}

//! Bearer token claim decoding.
//!
//! The token is `header.payload.signature`; only the payload is read. The
//! signature is never checked because the client holds no key.

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;

use std::fmt;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Error returned by [`decode_claims`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer than two dot-separated segments.
    #[error("token has no payload segment")]
    MissingPayload,
    /// The payload segment is not valid base64.
    #[error("token payload is not valid base64")]
    Base64,
    /// The payload decoded but is not a JSON object.
    #[error("token payload is not a JSON object: {0}")]
    Payload(String),
}

/// Normalized role carried by a token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    /// Absent, or any value other than `ADMIN`/`USER`.
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Normalize a raw role string: uppercase, then `ADMIN`/`USER` or unknown.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "ADMIN" => Self::Admin,
            "USER" => Self::User,
            _ => Self::Unknown,
        }
    }

    /// Normalize an authority string such as `ROLE_ADMIN`.
    #[must_use]
    pub fn from_authority(raw: &str) -> Self {
        Self::normalize(raw.strip_prefix("ROLE_").unwrap_or(raw))
    }

    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }

    #[must_use]
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Admin => Some("ADMIN"),
            Self::User => Some("USER"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("UNKNOWN"))
    }
}

/// Claims read from a token payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Claims {
    /// Expiry in seconds since the Unix epoch.
    pub exp: Option<i64>,
    /// `sub`, falling back to `userId`.
    pub subject: Option<String>,
    /// `role`, falling back to the first entry of `authorities`.
    pub role: Role,
}

impl Claims {
    /// True when `exp` is present and strictly after `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp > now)
    }

    /// Seconds until expiry; negative once expired.
    #[must_use]
    pub fn seconds_remaining(&self, now: i64) -> Option<i64> {
        self.exp.map(|exp| exp.saturating_sub(now))
    }

    fn from_payload(payload: &Map<String, Value>) -> Self {
        Self {
            exp: payload.get("exp").and_then(epoch_seconds),
            subject: non_empty_id(payload.get("sub")).or_else(|| non_empty_id(payload.get("userId"))),
            role: payload_role(payload),
        }
    }
}

/// Decode the claims of a compact token without verifying its signature.
///
/// # Errors
///
/// Returns [`DecodeError`] when the token has no payload segment, the
/// payload is not base64, or the decoded bytes are not a JSON object.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let segment = token.split('.').nth(1).ok_or(DecodeError::MissingPayload)?;
    let bytes = URL_SAFE_LENIENT
        .decode(segment)
        .or_else(|_| STANDARD_LENIENT.decode(segment))
        .map_err(|_| DecodeError::Base64)?;
    let payload: Map<String, Value> =
        serde_json::from_slice(&bytes).map_err(|e| DecodeError::Payload(e.to_string()))?;
    Ok(Claims::from_payload(&payload))
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    }
}

fn non_empty_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn payload_role(payload: &Map<String, Value>) -> Role {
    if let Some(role) = payload.get("role").and_then(Value::as_str).filter(|r| !r.is_empty()) {
        return Role::normalize(role);
    }
    payload
        .get("authorities")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .and_then(Value::as_str)
        .map_or(Role::Unknown, Role::from_authority)
}

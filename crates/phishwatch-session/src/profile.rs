//! Best-effort decoding of the display profile embedded in the credential.
//!
//! # Design
//! - The payload is read without any signature check. The result is cosmetic
//!   and must never feed an authorization decision.
//! - Every failure degrades to the empty profile; callers never see an error.
//! - Each missing or non-string field becomes `""` on its own.

use base64::{Engine as _, engine::general_purpose};
use serde_json::{Map, Value};
use tracing::debug;

/// Display attributes recovered from the credential payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionProfile {
    /// Account name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Avatar URL.
    pub profile_image: String,
}

impl SessionProfile {
    /// Whether every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.email.is_empty() && self.profile_image.is_empty()
    }
}

/// Why a payload could not be read. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProfileDecodeError {
    MissingSegment,
    Encoding,
    Json,
    NotAnObject,
}

impl ProfileDecodeError {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSegment => "missing_payload_segment",
            Self::Encoding => "invalid_base64",
            Self::Json => "invalid_json",
            Self::NotAnObject => "payload_not_object",
        }
    }
}

/// Recover the display profile from `token`. Never fails.
#[must_use]
pub fn decode(token: &str) -> SessionProfile {
    payload_claims(token).map_or_else(
        |reason| {
            debug!(reason = reason.as_str(), "credential payload not decodable");
            SessionProfile::default()
        },
        |claims| SessionProfile {
            username: string_claim(&claims, "username"),
            email: string_claim(&claims, "email"),
            profile_image: string_claim(&claims, "profileImage"),
        },
    )
}

fn payload_claims(token: &str) -> Result<Map<String, Value>, ProfileDecodeError> {
    let segment = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(ProfileDecodeError::MissingSegment)?;
    let bytes = decode_segment(segment)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        Ok(_) => Err(ProfileDecodeError::NotAnObject),
        Err(_) => Err(ProfileDecodeError::Json),
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, ProfileDecodeError> {
    let unpadded = segment.trim_end_matches('=');
    general_purpose::URL_SAFE_NO_PAD
        .decode(unpadded)
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(unpadded))
        .map_err(|_| ProfileDecodeError::Encoding)
}

fn string_claim(claims: &Map<String, Value>, key: &str) -> String {
    claims
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

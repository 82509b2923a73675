//! Base64url and JSON helpers for compact token segments
//!
//! Segments are encoded without padding (RFC 7515). Decoding accepts input
//! with or without trailing `=`, so padding is effectively re-derived from the
//! length modulo 4.

use crate::error::{TokenError, TokenResult};
use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Serialize, de::DeserializeOwned};

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64url encode without padding
#[inline]
pub fn base64_url_encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(input)
}

/// Base64url decode, tolerating optional padding
///
/// # Errors
/// Returns [`TokenError::InvalidToken`] if the input is not valid base64url.
#[inline]
pub fn base64_url_decode(input: &str) -> TokenResult<Vec<u8>> {
    URL_SAFE_LENIENT
        .decode(input)
        .map_err(|e| TokenError::invalid_token(format!("invalid base64url segment: {e}")))
}

/// Serialize a value to compact JSON bytes
///
/// # Errors
/// Returns [`TokenError::Encoding`] if the value cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn json_encode<T: Serialize + ?Sized>(value: &T) -> TokenResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize JSON bytes
///
/// # Errors
/// Returns [`TokenError::Encoding`] on malformed JSON or a shape mismatch.
pub fn json_decode<T: DeserializeOwned>(input: &[u8]) -> TokenResult<T> {
    Ok(serde_json::from_slice(input)?)
}

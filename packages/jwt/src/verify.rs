//! Token decoding and ES256 verification

use crate::{
    der::{ES256_PART_LENGTH, raw_to_der},
    encoding::{base64_url_decode, json_decode},
    error::{TokenError, TokenResult},
    keys,
};
use ecsign_common::LoggingTransformer;
use p256::ecdsa::{Signature, signature::Verifier};
use serde_json::Value;

/// Segments of a compact token, decoded but not verified
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    /// Header JSON
    pub header: Value,
    /// Payload JSON
    pub payload: Value,
    /// Raw signature bytes from the third segment
    pub signature: Vec<u8>,
}

/// Split a token into its three segments
fn split(token: &str) -> TokenResult<(&str, &str, &str)> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok((header, payload, signature)),
        _ => Err(TokenError::invalid_token("expected three dot-separated segments")),
    }
}

/// Decode a compact token without checking its signature
///
/// # Errors
/// [`TokenError::InvalidToken`] on a wrong segment count or bad base64url,
/// [`TokenError::Encoding`] if header or payload is not JSON.
pub fn decode(token: &str) -> TokenResult<DecodedToken> {
    let (header_b64, payload_b64, signature_b64) = split(token)?;

    Ok(DecodedToken {
        header: json_decode(&base64_url_decode(header_b64)?)?,
        payload: json_decode(&base64_url_decode(payload_b64)?)?,
        signature: base64_url_decode(signature_b64)?,
    })
}

/// Verify an ES256 token and return its payload
///
/// `public_key` may be SPKI PEM, SPKI DER, or a SEC1 point. The raw
/// signature is converted to DER before it reaches the verifier.
///
/// # Errors
/// - [`TokenError::InvalidKey`] if the public key cannot be parsed
/// - [`TokenError::InvalidToken`] / [`TokenError::Encoding`] as for [`decode`]
/// - [`TokenError::InvalidToken`] if the header `alg` is not `ES256`
/// - [`TokenError::InvalidLength`] if the signature is not 64 bytes
/// - [`TokenError::InvalidSignature`] if the signature does not verify
pub fn verify(token: &str, public_key: &[u8]) -> TokenResult<Value> {
    let verifying_key = keys::parse_public_key(public_key)?;
    let decoded = decode(token)?;

    match decoded.header.get("alg").and_then(Value::as_str) {
        Some("ES256") => {}
        other => {
            return Err(TokenError::invalid_token(format!(
                "unsupported alg {}",
                other.unwrap_or("<missing>")
            )));
        }
    }

    let der = raw_to_der(&decoded.signature, ES256_PART_LENGTH)?;
    let signature = Signature::from_der(&der).map_err(|_| TokenError::InvalidSignature)?;

    let (signing_input, _) = token
        .rsplit_once('.')
        .ok_or_else(|| TokenError::invalid_token("missing signature segment"))?;

    let verified = verifying_key
        .verify(signing_input.as_bytes(), &signature)
        .is_ok();
    LoggingTransformer::log_verification("ES256", verified);
    if !verified {
        return Err(TokenError::InvalidSignature);
    }

    Ok(decoded.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::base64_url_encode;

    #[test]
    fn test_decode_shape_errors() {
        assert!(matches!(decode("a.b"), Err(TokenError::InvalidToken(_))));
        assert!(matches!(decode("a.b.c.d"), Err(TokenError::InvalidToken(_))));
        assert!(matches!(decode("!!.e30.AA"), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_segments() {
        let token = format!(
            "{}.{}.{}",
            base64_url_encode(br#"{"alg":"ES256"}"#),
            base64_url_encode(br#"{"iss":"X"}"#),
            base64_url_encode([0x01, 0x02])
        );
        let decoded = decode(&token).expect("well-formed token");
        assert_eq!(decoded.header["alg"], "ES256");
        assert_eq!(decoded.payload["iss"], "X");
        assert_eq!(decoded.signature, vec![0x01, 0x02]);
    }

    #[test]
    fn test_decode_non_json_payload() {
        let token = format!(
            "{}.{}.",
            base64_url_encode(br#"{"alg":"ES256"}"#),
            base64_url_encode(b"not json")
        );
        assert!(matches!(decode(&token), Err(TokenError::Encoding(_))));
    }
}

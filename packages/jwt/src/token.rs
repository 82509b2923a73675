//! Compact token assembly
//!
//! `base64url(JSON(header)) . base64url(JSON(payload)) . base64url(R ‖ S)`

use crate::{
    der::{ES256_PART_LENGTH, der_to_raw},
    encoding::{base64_url_encode, json_encode},
    error::TokenResult,
    signer::DerSigner,
    types::Token,
};
use serde::Serialize;

/// Sign `payload` under `header` and return the compact token
///
/// The signer's DER output is converted to the 64-byte raw form that JWS
/// ES256 consumers expect. Nothing is retried: the first failure is returned.
///
/// # Errors
/// - [`TokenError::Encoding`](crate::TokenError::Encoding) if header or payload
///   cannot be serialized
/// - [`TokenError::Signing`](crate::TokenError::Signing) if the signer fails
/// - [`TokenError::MalformedDer`](crate::TokenError::MalformedDer) if the
///   signer returns something that is not a P-256 DER signature
pub fn sign<P, H, S>(payload: &P, header: &H, signer: &S) -> TokenResult<Token>
where
    P: Serialize + ?Sized,
    H: Serialize + ?Sized,
    S: DerSigner + ?Sized,
{
    let header_b64 = base64_url_encode(json_encode(header)?);
    let payload_b64 = base64_url_encode(json_encode(payload)?);

    let mut signing_input = String::with_capacity(header_b64.len() + 1 + payload_b64.len());
    signing_input.push_str(&header_b64);
    signing_input.push('.');
    signing_input.push_str(&payload_b64);

    let der = signer.sign_der(signing_input.as_bytes())?;
    let raw = der_to_raw(&der, ES256_PART_LENGTH)?;
    let signature_b64 = base64_url_encode(&raw);

    tracing::debug!(
        alg = signer.alg(),
        signing_input_len = signing_input.len(),
        der_len = der.len(),
        "assembled compact token"
    );
    Ok(Token::from_segments(signing_input, &signature_b64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use serde_json::json;
    use std::collections::HashMap;

    /// Returns a fixed DER signature regardless of input
    struct FixedSigner(Vec<u8>);

    impl DerSigner for FixedSigner {
        fn sign_der(&self, _message: &[u8]) -> TokenResult<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn alg(&self) -> &'static str {
            "ES256"
        }
    }

    struct FailingSigner;

    impl DerSigner for FailingSigner {
        fn sign_der(&self, _message: &[u8]) -> TokenResult<Vec<u8>> {
            Err(TokenError::signing("key unavailable"))
        }

        fn alg(&self) -> &'static str {
            "ES256"
        }
    }

    fn fixed_der() -> Vec<u8> {
        let mut der = vec![0x30, 0x45, 0x02, 0x21, 0x00, 0xff];
        der.extend_from_slice(&[0xaa; 31]);
        der.extend_from_slice(&[0x02, 0x20]);
        der.extend_from_slice(&[0x01; 32]);
        der
    }

    #[test]
    fn test_assembles_three_segments() {
        let header = json!({"alg": "ES256", "kid": "K"});
        let payload = json!({"iss": "X", "exp": 123});
        let token = sign(&payload, &header, &FixedSigner(fixed_der())).expect("token");

        let parts: Vec<&str> = token.as_str().split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], base64_url_encode(br#"{"alg":"ES256","kid":"K"}"#));
        assert_eq!(parts[1], base64_url_encode(br#"{"exp":123,"iss":"X"}"#));

        let mut raw = vec![0xff];
        raw.extend_from_slice(&[0xaa; 31]);
        raw.extend_from_slice(&[0x01; 32]);
        assert_eq!(parts[2], base64_url_encode(&raw));
        assert!(!token.as_str().contains('='));
    }

    #[test]
    fn test_signer_failure_propagates() {
        let err = sign(&json!({}), &json!({"alg": "ES256"}), &FailingSigner)
            .expect_err("signer fails");
        assert_eq!(err, TokenError::Signing("key unavailable".to_string()));
    }

    #[test]
    fn test_bad_signer_output_is_rejected() {
        let err = sign(&json!({}), &json!({"alg": "ES256"}), &FixedSigner(vec![0x31, 0x00]))
            .expect_err("not DER");
        assert!(matches!(err, TokenError::MalformedDer(_)));
    }

    #[test]
    fn test_unencodable_payload() {
        let mut payload = HashMap::new();
        payload.insert((1, 2), "tuple keys are not JSON");
        let err = sign(&payload, &json!({"alg": "ES256"}), &FixedSigner(fixed_der()))
            .expect_err("payload not encodable");
        assert!(matches!(err, TokenError::Encoding(_)));
    }

    #[test]
    fn test_null_payload_is_encoded() {
        let token = sign(&Option::<u8>::None, &json!({"alg": "ES256"}), &FixedSigner(fixed_der()))
            .expect("null payload");
        assert_eq!(token.as_str().split('.').nth(1), Some("bnVsbA"));
    }
}

//! ES256 key parsing and generation
//!
//! Private keys are accepted as PKCS#8 PEM (the `.p8` format), PKCS#8 DER, or
//! a raw 32-byte scalar. Public keys as SPKI PEM, SPKI DER, or a SEC1 point.

use crate::error::{TokenError, TokenResult};
use p256::{
    ecdsa::{SigningKey, VerifyingKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey},
};
use zeroize::{Zeroize, ZeroizeOnDrop};

const PEM_PREFIX: &[u8] = b"-----BEGIN";
/// P-256 scalar width
const SCALAR_LENGTH: usize = 32;

/// Key pair for ES256
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Es256KeyPair {
    /// Raw 32-byte private scalar
    pub private_key: Vec<u8>,
    /// Uncompressed SEC1 public point (65 bytes: 0x04 ‖ x ‖ y)
    #[zeroize(skip)]
    pub public_key: Vec<u8>,
}

impl std::fmt::Debug for Es256KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Es256KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// Generate a new ES256 key pair from system entropy
///
/// # Errors
/// Returns [`TokenError::Signing`] in the negligible case that the random
/// bytes are not a valid P-256 scalar.
pub fn generate_keypair() -> TokenResult<Es256KeyPair> {
    use rand::Rng;

    let mut scalar = zeroize::Zeroizing::new([0u8; SCALAR_LENGTH]);
    rand::rng().fill(&mut scalar[..]);

    let signing_key = SigningKey::from_slice(&scalar[..])
        .map_err(|e| TokenError::signing(format!("failed to create signing key: {e}")))?;

    let public_key = signing_key
        .verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec();

    Ok(Es256KeyPair {
        private_key: signing_key.to_bytes().to_vec(),
        public_key,
    })
}

/// Parse private key material, detecting the format
///
/// # Errors
/// Returns [`TokenError::Signing`] if the material is not a usable P-256 key.
pub fn parse_private_key(material: &[u8]) -> TokenResult<SigningKey> {
    if material.starts_with(PEM_PREFIX) {
        let pem = std::str::from_utf8(material)
            .map_err(|_| TokenError::signing("invalid UTF-8 in PEM private key"))?;
        parse_pkcs8_pem(pem)
    } else if material.len() == SCALAR_LENGTH {
        parse_scalar(material)
    } else {
        parse_pkcs8_der(material)
    }
}

/// Parse a PKCS#8 PEM private key
///
/// # Errors
/// Returns [`TokenError::Signing`] if the PEM is not a P-256 PKCS#8 key.
pub fn parse_pkcs8_pem(pem: &str) -> TokenResult<SigningKey> {
    SigningKey::from_pkcs8_pem(pem.trim())
        .map_err(|e| TokenError::signing(format!("invalid PKCS#8 PEM private key: {e}")))
}

/// Parse a PKCS#8 DER private key
///
/// # Errors
/// Returns [`TokenError::Signing`] if the DER is not a P-256 PKCS#8 key.
pub fn parse_pkcs8_der(der: &[u8]) -> TokenResult<SigningKey> {
    SigningKey::from_pkcs8_der(der)
        .map_err(|e| TokenError::signing(format!("invalid PKCS#8 DER private key: {e}")))
}

/// Parse a raw 32-byte private scalar
///
/// # Errors
/// Returns [`TokenError::Signing`] on a wrong length, zero, or out-of-range scalar.
pub fn parse_scalar(scalar: &[u8]) -> TokenResult<SigningKey> {
    if scalar.len() != SCALAR_LENGTH {
        return Err(TokenError::signing(format!(
            "private key must be {SCALAR_LENGTH} bytes for P-256, got {}",
            scalar.len()
        )));
    }
    SigningKey::from_slice(scalar)
        .map_err(|_| TokenError::signing("invalid P-256 private key bytes"))
}

/// Parse public key material, detecting the format
///
/// # Errors
/// Returns [`TokenError::InvalidKey`] if the material is not a P-256 public key.
pub fn parse_public_key(material: &[u8]) -> TokenResult<VerifyingKey> {
    if material.starts_with(PEM_PREFIX) {
        let pem = std::str::from_utf8(material)
            .map_err(|_| TokenError::invalid_key("invalid UTF-8 in PEM public key"))?;
        VerifyingKey::from_public_key_pem(pem.trim())
            .map_err(|e| TokenError::invalid_key(format!("invalid SPKI PEM public key: {e}")))
    } else {
        match material.len() {
            33 | 65 => VerifyingKey::from_sec1_bytes(material)
                .map_err(|_| TokenError::invalid_key("invalid SEC1 public key bytes")),
            _ => VerifyingKey::from_public_key_der(material).map_err(|e| {
                TokenError::invalid_key(format!("invalid SPKI DER public key: {e}"))
            }),
        }
    }
}

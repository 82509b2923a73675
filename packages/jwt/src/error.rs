//! Token and signature codec error types

use thiserror::Error;

/// Result type for token and codec operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Errors raised while encoding, signing, decoding or verifying tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Raw signature is not exactly twice the field width
    #[error("Invalid raw signature length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length (`2 × part_length`)
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// DER input violates the `SEQUENCE { INTEGER, INTEGER }` grammar
    #[error("Malformed DER signature: {0}")]
    MalformedDer(String),

    /// JSON encoding or decoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Key unusable or the signing primitive reported failure
    #[error("Signing error: {0}")]
    Signing(String),

    /// Compact token has the wrong shape or bad base64url segments
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Public key could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Signature did not verify against the public key
    #[error("Invalid token signature")]
    InvalidSignature,
}

impl TokenError {
    /// Create a malformed DER error
    #[inline]
    #[must_use]
    pub fn malformed_der(msg: impl Into<String>) -> Self {
        Self::MalformedDer(msg.into())
    }

    /// Create an encoding error
    #[inline]
    #[must_use]
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a signing error
    #[inline]
    #[must_use]
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create an invalid token error
    #[inline]
    #[must_use]
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    /// Create an invalid key error
    #[inline]
    #[must_use]
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}

//! Fluent ES256 token builder
//!
//! ```no_run
//! use ecsign_jwt::{Token, claims::ClaimsBuilder};
//! use chrono::Duration;
//!
//! # fn main() -> ecsign_jwt::TokenResult<()> {
//! let key = std::fs::read("AuthKey_2X9R4HXF34.p8").unwrap_or_default();
//! let claims = ClaimsBuilder::new()
//!     .issuer("57246542-96fe-1a63-e053-0824d011072a")
//!     .issued_now()
//!     .expires_in(Duration::minutes(20))
//!     .build();
//!
//! let token = Token::es256()
//!     .with_private_key(&key)
//!     .with_key_id("2X9R4HXF34")
//!     .with_claims(&claims)?
//!     .sign()?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

use crate::{
    error::{TokenError, TokenResult},
    signer::{DerSigner, Es256Signer},
    token,
    types::{Header, Token},
};
use ecsign_common::LoggingTransformer;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Where the signature comes from
#[derive(Clone)]
enum KeySource {
    /// Private key material, parsed when the token is signed
    Material(Zeroizing<Vec<u8>>),
    /// Caller supplied signer
    Signer(Arc<dyn DerSigner>),
}

impl KeySource {
    fn resolve(&self) -> TokenResult<Arc<dyn DerSigner>> {
        match self {
            KeySource::Material(material) => {
                Ok(Arc::new(Es256Signer::from_key_material(material)?))
            }
            KeySource::Signer(signer) => Ok(Arc::clone(signer)),
        }
    }
}

/// ES256 token builder - initial state
#[derive(Debug, Default)]
pub struct TokenBuilder;

impl TokenBuilder {
    /// Create a builder
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Sign with private key material (PKCS#8 PEM or DER, or a raw scalar)
    ///
    /// The key is parsed when the token is signed; an unusable key surfaces
    /// then as [`TokenError::Signing`].
    #[must_use]
    pub fn with_private_key(self, private_key: &[u8]) -> TokenWithKey {
        TokenWithKey::new(KeySource::Material(Zeroizing::new(private_key.to_vec())))
    }

    /// Sign with a caller supplied signer
    #[must_use]
    pub fn with_signer(self, signer: impl DerSigner + 'static) -> TokenWithKey {
        TokenWithKey::new(KeySource::Signer(Arc::new(signer)))
    }
}

/// Builder with a key configured
#[derive(Clone)]
pub struct TokenWithKey {
    key: KeySource,
    kid: Option<String>,
    typ: Option<String>,
    params: Vec<(String, Value)>,
}

impl TokenWithKey {
    fn new(key: KeySource) -> Self {
        Self {
            key,
            kid: None,
            typ: Some("JWT".to_string()),
            params: Vec::new(),
        }
    }

    /// Set the `kid` header parameter
    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Set the `typ` header parameter (defaults to `JWT`)
    #[must_use]
    pub fn with_type(mut self, typ: impl Into<String>) -> Self {
        self.typ = Some(typ.into());
        self
    }

    /// Omit the `typ` header parameter
    #[must_use]
    pub fn without_type(mut self) -> Self {
        self.typ = None;
        self
    }

    /// Add a custom header parameter
    #[must_use]
    pub fn with_header_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.push((name.into(), value));
        self
    }

    /// Set the token payload
    ///
    /// # Errors
    /// Returns [`TokenError::Encoding`] if the claims cannot be serialized.
    pub fn with_claims<T: Serialize>(self, claims: T) -> TokenResult<TokenWithClaims> {
        let payload = serde_json::to_value(claims)
            .map_err(|e| TokenError::encoding(format!("Failed to serialize claims: {e}")))?;

        Ok(TokenWithClaims { config: self, payload })
    }
}

/// Builder with key and claims configured
#[derive(Clone)]
pub struct TokenWithClaims {
    config: TokenWithKey,
    payload: Value,
}

impl TokenWithClaims {
    /// Header that [`sign`](Self::sign) will use for a signer with `alg`
    fn header(&self, alg: &str) -> Header {
        let mut header = Header::new(alg);
        header.kid.clone_from(&self.config.kid);
        header.typ.clone_from(&self.config.typ);
        for (name, value) in &self.config.params {
            header.extra.insert(name.clone(), value.clone());
        }
        header
    }

    fn sign_inner(&self) -> TokenResult<Token> {
        let signer = self.config.key.resolve()?;
        let header = self.header(signer.alg());
        token::sign(&self.payload, &header, &signer)
    }

    /// Sign the token
    ///
    /// # Errors
    /// Any [`TokenError`] from key parsing, encoding, signing or DER conversion.
    pub fn sign(&self) -> TokenResult<Token> {
        match self.sign_inner() {
            Ok(token) => {
                let kid = self.config.kid.as_deref();
                LoggingTransformer::log_signing("ES256", kid, token.as_str().len());
                Ok(token)
            }
            Err(e) => {
                LoggingTransformer::log_token_error("token_signing", "ES256", &e);
                Err(e)
            }
        }
    }

    /// Sign the token on the blocking thread pool
    ///
    /// # Errors
    /// As [`sign`](Self::sign), or [`TokenError::Signing`] if the blocking
    /// task is cancelled or panics.
    pub async fn sign_async(self) -> TokenResult<Token> {
        tokio::task::spawn_blocking(move || self.sign())
            .await
            .map_err(|e| TokenError::signing(format!("signing task failed: {e}")))?
    }
}

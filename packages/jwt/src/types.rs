//! Token header and compact token types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JOSE header for ES256 tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Signing algorithm
    pub alg: String,
    /// Key identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Token type, usually `JWT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Additional header parameters
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Header {
    /// Header with the given algorithm and nothing else
    #[must_use]
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            kid: None,
            typ: None,
            extra: Map::new(),
        }
    }

    /// `{"alg":"ES256","kid":..}` header
    #[must_use]
    pub fn es256(kid: impl Into<String>) -> Self {
        Self::new("ES256").with_key_id(kid)
    }

    /// Set the key id
    #[must_use]
    pub fn with_key_id(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Set the token type
    #[must_use]
    pub fn with_type(mut self, typ: impl Into<String>) -> Self {
        self.typ = Some(typ.into());
        self
    }

    /// Add a custom header parameter
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// Compact serialized token: `header.payload.signature`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub(crate) fn from_segments(signing_input: String, signature_b64: &str) -> Self {
        let mut token = signing_input;
        token.reserve(1 + signature_b64.len());
        token.push('.');
        token.push_str(signature_b64);
        Self(token)
    }

    /// Start building an ES256 token
    #[must_use]
    pub fn es256() -> crate::builder::TokenBuilder {
        crate::builder::TokenBuilder::new()
    }

    /// Token text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the token text
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// The `header.payload` part that was signed
    #[must_use]
    pub fn signing_input(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(input, _)| input)
    }

    /// Base64url signature segment
    #[must_use]
    pub fn signature(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(_, sig)| sig)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_es256_header_serialization() {
        let header = Header::es256("K");
        assert_eq!(
            serde_json::to_string(&header).expect("serializable"),
            r#"{"alg":"ES256","kid":"K"}"#
        );

        let header = Header::es256("K").with_type("JWT").with_param("x5t", json!("abc"));
        let value = serde_json::to_value(&header).expect("serializable");
        assert_eq!(value, json!({"alg": "ES256", "kid": "K", "typ": "JWT", "x5t": "abc"}));
    }

    #[test]
    fn test_header_round_trip_keeps_extra_params() {
        let parsed: Header =
            serde_json::from_str(r#"{"alg":"ES256","typ":"JWT","cty":"x"}"#).expect("valid header");
        assert_eq!(parsed.alg, "ES256");
        assert_eq!(parsed.typ.as_deref(), Some("JWT"));
        assert!(parsed.kid.is_none());
        assert_eq!(parsed.extra.get("cty"), Some(&json!("x")));
    }

    #[test]
    fn test_token_segments() {
        let token = Token::from_segments("aGVhZGVy.cGF5bG9hZA".to_string(), "c2ln");
        assert_eq!(token.as_str(), "aGVhZGVy.cGF5bG9hZA.c2ln");
        assert_eq!(token.signing_input(), "aGVhZGVy.cGF5bG9hZA");
        assert_eq!(token.signature(), "c2ln");
        assert_eq!(token.to_string(), token.as_str());
        assert_eq!(String::from(token.clone()), token.into_string());
    }
}

//! API token claims and builder with compile-time validation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, marker::PhantomData};

/// Audience expected by the App Store Connect API.
pub const APP_STORE_CONNECT_AUDIENCE: &str = "appstoreconnect-v1";

/// Typestate markers for builder pattern.
pub mod ts {
    /// Marker for a field that has been set.
    pub struct Set;
    /// Marker for a field that has not been set.
    pub struct Unset;
}

/// Immutable API token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer.
    pub iss: String,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Audience.
    pub aud: String,
    /// Bundle id the token is restricted to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid: Option<String>,
    /// Allowed request scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<String>>,
    /// Custom data.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Claims {
    /// Seconds between issue and expiry.
    #[must_use]
    pub fn lifetime(&self) -> i64 {
        self.exp - self.iat
    }
}

/// Compile-time checked builder for API claims.
pub struct ClaimsBuilder<Iss = ts::Unset, Iat = ts::Unset, Exp = ts::Unset> {
    iss: Option<String>,
    iat: Option<DateTime<Utc>>,
    exp: Option<Duration>,
    aud: String,
    bid: Option<String>,
    scope: Option<Vec<String>>,
    extra: BTreeMap<String, Value>,
    _phantom: PhantomData<(Iss, Iat, Exp)>,
}

impl ClaimsBuilder {
    /// Create a new claims builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            iss: None,
            iat: None,
            exp: None,
            aud: APP_STORE_CONNECT_AUDIENCE.to_string(),
            bid: None,
            scope: None,
            extra: BTreeMap::new(),
            _phantom: PhantomData,
        }
    }
}

impl<Iss, Iat, Exp> ClaimsBuilder<Iss, Iat, Exp> {
    fn retype<I, A, E>(self) -> ClaimsBuilder<I, A, E> {
        ClaimsBuilder {
            iss: self.iss,
            iat: self.iat,
            exp: self.exp,
            aud: self.aud,
            bid: self.bid,
            scope: self.scope,
            extra: self.extra,
            _phantom: PhantomData,
        }
    }
}

impl<Iat, Exp> ClaimsBuilder<ts::Unset, Iat, Exp> {
    /// Set the issuer (iss) claim.
    pub fn issuer(mut self, iss: impl Into<String>) -> ClaimsBuilder<ts::Set, Iat, Exp> {
        self.iss = Some(iss.into());
        self.retype()
    }
}

impl<Iss, Exp> ClaimsBuilder<Iss, ts::Unset, Exp> {
    /// Set the issued-at time to now.
    pub fn issued_now(self) -> ClaimsBuilder<Iss, ts::Set, Exp> {
        self.issued_at(Utc::now())
    }

    /// Set an explicit issued-at time.
    pub fn issued_at(mut self, iat: DateTime<Utc>) -> ClaimsBuilder<Iss, ts::Set, Exp> {
        self.iat = Some(iat);
        self.retype()
    }
}

impl<Iss, Iat> ClaimsBuilder<Iss, Iat, ts::Unset> {
    /// Set the expiration relative to the issued-at time.
    pub fn expires_in(mut self, lifetime: Duration) -> ClaimsBuilder<Iss, Iat, ts::Set> {
        self.exp = Some(lifetime);
        self.retype()
    }
}

impl<Iss, Iat, Exp> ClaimsBuilder<Iss, Iat, Exp> {
    /// Override the audience (aud) claim.
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = aud.into();
        self
    }

    /// Restrict the token to a bundle id (bid).
    pub fn bundle_id(mut self, bid: impl Into<String>) -> Self {
        self.bid = Some(bid.into());
        self
    }

    /// Add an allowed request scope, e.g. `GET /v1/apps`.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope.get_or_insert_with(Vec::new).push(scope.into());
        self
    }

    /// Add a custom claim.
    pub fn claim(mut self, k: impl Into<String>, v: Value) -> Self {
        self.extra.insert(k.into(), v);
        self
    }
}

impl ClaimsBuilder<ts::Set, ts::Set, ts::Set> {
    /// Build the claims. All required fields must be set.
    #[must_use]
    pub fn build(self) -> Claims {
        // The typestate guarantees these are present; fall back rather than panic.
        let iat = self.iat.unwrap_or_else(|| {
            tracing::error!("ClaimsBuilder: issued-at unexpectedly None despite type guarantees");
            Utc::now()
        });
        let exp = self.exp.unwrap_or_else(|| {
            tracing::error!("ClaimsBuilder: expiry unexpectedly None despite type guarantees");
            Duration::zero()
        });
        Claims {
            iss: self.iss.unwrap_or_else(|| {
                tracing::error!("ClaimsBuilder: issuer unexpectedly None despite type guarantees");
                String::new()
            }),
            iat: iat.timestamp(),
            exp: (iat + exp).timestamp(),
            aud: self.aud,
            bid: self.bid,
            scope: self.scope,
            extra: self.extra,
        }
    }
}

impl Default for ClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_fields() {
        let issued = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let claims = ClaimsBuilder::new()
            .issuer("57246542-96fe-1a63-e053-0824d011072a")
            .issued_at(issued)
            .expires_in(Duration::minutes(20))
            .build();

        assert_eq!(claims.iss, "57246542-96fe-1a63-e053-0824d011072a");
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_001_200);
        assert_eq!(claims.lifetime(), 1200);
        assert_eq!(claims.aud, APP_STORE_CONNECT_AUDIENCE);
    }

    #[test]
    fn test_setter_order_does_not_matter() {
        let claims = ClaimsBuilder::new()
            .expires_in(Duration::minutes(5))
            .scope("GET /v1/apps")
            .issued_now()
            .issuer("X")
            .build();
        assert_eq!(claims.lifetime(), 300);
        assert_eq!(claims.scope, Some(vec!["GET /v1/apps".to_string()]));
    }

    #[test]
    fn test_serialization_shape() {
        let issued = DateTime::from_timestamp(100, 0).expect("valid timestamp");
        let claims = ClaimsBuilder::new()
            .issuer("X")
            .issued_at(issued)
            .expires_in(Duration::seconds(23))
            .bundle_id("com.example.app")
            .claim("role", json!("reader"))
            .build();

        assert_eq!(
            serde_json::to_value(&claims).expect("serializable"),
            json!({
                "iss": "X",
                "iat": 100,
                "exp": 123,
                "aud": "appstoreconnect-v1",
                "bid": "com.example.app",
                "role": "reader"
            })
        );

        let json = serde_json::to_string(&claims).expect("serializable");
        let parsed: Claims = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(parsed, claims);
    }

    #[test]
    fn test_custom_audience() {
        let claims = ClaimsBuilder::new()
            .issuer("X")
            .issued_now()
            .expires_in(Duration::hours(1))
            .audience("internal-api")
            .build();
        assert_eq!(claims.aud, "internal-api");
        assert!(claims.bid.is_none());
        assert!(claims.extra.is_empty());
    }
}

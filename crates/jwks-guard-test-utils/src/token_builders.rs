//! Builder patterns for test claims
//!
//! Provides fluent APIs for creating the claims of test tokens.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

/// Builder for creating test JWT claims
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_audience("orders-api")
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: Option<String>,
    aud: Option<Value>,
    exp: Option<i64>,
    nbf: Option<i64>,
    iat: i64,
}

impl TestTokenBuilder {
    /// Create a new builder with defaults: a subject, no audience, one hour expiry
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: Some("test-subject".to_string()),
            aud: None,
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            nbf: None,
            iat: now.timestamp(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Omit the `sub` claim
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    /// Set a single-string audience
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Some(Value::String(audience.to_string()));
        self
    }

    /// Set an array audience
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = Some(json!(audiences));
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Omit the `exp` claim
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Set not-before in seconds from now
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = Map::new();
        if let Some(sub) = self.sub {
            claims.insert("sub".to_string(), Value::String(sub));
        }
        if let Some(aud) = self.aud {
            claims.insert("aud".to_string(), aud);
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), json!(nbf));
        }
        claims.insert("iat".to_string(), json!(self.iat));
        Value::Object(claims)
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

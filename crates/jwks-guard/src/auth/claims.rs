//! JWT claims structure.
//!
//! Contains the claims extracted from validated JWTs. The `sub` field is
//! redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// JWT Claims structure for validated tokens.
///
/// `aud` must be a single string; tokens carrying an audience array fail
/// to deserialize and are rejected.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - redacted in Debug output.
    pub sub: String,

    /// Audience the token was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("iss", &self.iss)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .finish()
    }
}

impl Claims {
    /// True if `aud` is present and exactly equals `expected`.
    pub fn audience_matches(&self, expected: &str) -> bool {
        self.aud.as_deref() == Some(expected)
    }
}

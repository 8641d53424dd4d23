//! JWT validation.
//!
//! Validates incoming JWTs using public keys resolved from the JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only RS256 is accepted
//! - `exp` and `nbf` are enforced when present
//! - `aud` must equal the configured audience
//! - Every failure maps to `AuthError::Verification` with detail for logs only

use crate::auth::cache::KeyCache;
use crate::auth::claims::Claims;
use crate::auth::jwks::JwksClient;
use crate::auth::public_key::PublicKey;
use crate::auth::resolver::KeyResolver;
use crate::config::Config;
use crate::errors::AuthError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Larger tokens are rejected before any decoding or key resolution.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// The single signature scheme accepted.
pub const ACCEPTED_ALGORITHM: Algorithm = Algorithm::RS256;

/// JWT validator using keys resolved by `kid`.
pub struct JwtValidator {
    resolver: Arc<KeyResolver>,

    /// Expected `aud` claim.
    audience: String,
}

impl JwtValidator {
    pub fn new(resolver: Arc<KeyResolver>, audience: String) -> Self {
        Self { resolver, audience }
    }

    /// Wire a validator from configuration and an embedder-owned cache.
    pub fn from_config(config: &Config, cache: Arc<dyn KeyCache>) -> Self {
        let fetcher = Arc::new(JwksClient::from_config(config));
        let resolver = Arc::new(KeyResolver::new(cache, fetcher));
        Self::new(resolver, config.audience.clone())
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Validate a JWT and return the claims.
    ///
    /// # Security Checks
    ///
    /// 1. Size check - reject tokens > 8KB before parsing
    /// 2. Header must name RS256 and carry a non-empty `kid`
    /// 3. Resolve the public key for `kid`
    /// 4. Verify the signature and time claims
    /// 5. Compare `aud` with the configured audience
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Verification` for all validation failures.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_inner(token, None).await
    }

    /// Like [`Self::validate`], but key resolution aborts when `cancel` fires.
    #[instrument(skip_all)]
    pub async fn validate_cancellable(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Claims, AuthError> {
        self.validate_inner(token, Some(cancel)).await
    }

    async fn validate_inner(
        &self,
        token: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Claims, AuthError> {
        let kid = extract_kid(token)?;

        let resolved = match cancel {
            Some(cancel) => self.resolver.resolve_cancellable(&kid, cancel).await,
            None => self.resolver.resolve(&kid).await,
        };
        let key = resolved.map_err(|e| {
            tracing::debug!(target: "jwks_guard.auth.jwt", kid = %kid, error = %e, "Key resolution failed");
            AuthError::from(e)
        })?;

        let claims = verify_token(token, &key)?;

        if !claims.audience_matches(&self.audience) {
            tracing::debug!(target: "jwks_guard.auth.jwt", aud = ?claims.aud, "Token audience mismatch");
            return Err(AuthError::Verification("audience mismatch".to_string()));
        }

        tracing::debug!(target: "jwks_guard.auth.jwt", "Token validated successfully");
        Ok(claims)
    }
}

/// Read the `kid` from an RS256 token header without verifying anything else.
///
/// # Errors
///
/// Returns `AuthError::Verification` if the token is oversized, malformed,
/// uses another algorithm, or has no non-empty `kid`.
pub fn extract_kid(token: &str) -> Result<String, AuthError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "jwks_guard.auth.jwt",
            size = token.len(),
            "Token exceeds size limit"
        );
        return Err(AuthError::Verification(
            "token exceeds size limit".to_string(),
        ));
    }

    let header = decode_header(token).map_err(|e| {
        tracing::debug!(target: "jwks_guard.auth.jwt", error = %e, "Malformed token header");
        AuthError::Verification(format!("malformed token header: {e}"))
    })?;

    if header.alg != ACCEPTED_ALGORITHM {
        tracing::debug!(target: "jwks_guard.auth.jwt", alg = ?header.alg, "Unexpected token algorithm");
        return Err(AuthError::Verification(format!(
            "unsupported algorithm {:?}",
            header.alg
        )));
    }

    header.kid.filter(|kid| !kid.is_empty()).ok_or_else(|| {
        tracing::debug!(target: "jwks_guard.auth.jwt", "Token header missing kid");
        AuthError::Verification("token header missing kid".to_string())
    })
}

/// Verify the RS256 signature and time claims, returning the claims.
fn verify_token(token: &str, key: &PublicKey) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(ACCEPTED_ALGORITHM);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // Audience is compared exactly after decoding
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &key.to_decoding_key(), &validation).map_err(|e| {
        tracing::debug!(target: "jwks_guard.auth.jwt", error = %e, "Token verification failed");
        AuthError::Verification(format!("token verification failed: {e}"))
    })?;

    Ok(token_data.claims)
}

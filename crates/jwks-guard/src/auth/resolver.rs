//! Cache-first public key resolution.
//!
//! A cached key is returned as-is, with no revalidation or expiry check.
//! On a miss the key is fetched and stored before being returned. Failed
//! fetches are never cached, so the next call fetches again.
//!
//! Concurrent misses for the same `kid` are independent: each caller may
//! fetch and write the cache, and the last writer wins.

use crate::auth::cache::KeyCache;
use crate::auth::jwks::KeyFetcher;
use crate::auth::public_key::PublicKey;
use crate::errors::KeyError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Resolves a `kid` to a verification key via the cache and a fetcher.
pub struct KeyResolver {
    cache: Arc<dyn KeyCache>,
    fetcher: Arc<dyn KeyFetcher>,
}

impl KeyResolver {
    pub fn new(cache: Arc<dyn KeyCache>, fetcher: Arc<dyn KeyFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// Resolve `kid` to a public key.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error unchanged on a cache miss that cannot be
    /// satisfied. The cache is not modified in that case.
    #[instrument(skip_all, fields(kid = %kid))]
    pub async fn resolve(&self, kid: &str) -> Result<PublicKey, KeyError> {
        if let Some(key) = self.cache.get(kid).await {
            tracing::debug!(target: "jwks_guard.auth.resolver", kid = %kid, "Key cache hit");
            return Ok(key);
        }

        tracing::debug!(target: "jwks_guard.auth.resolver", kid = %kid, "Key cache miss");

        let key = self.fetcher.fetch_key(kid).await?;
        self.cache.set(kid, key.clone()).await;

        Ok(key)
    }

    /// Resolve `kid`, aborting if `cancel` fires first.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Cancelled` if the token is cancelled before the
    /// resolution completes; otherwise behaves like [`Self::resolve`].
    pub async fn resolve_cancellable(
        &self,
        kid: &str,
        cancel: &CancellationToken,
    ) -> Result<PublicKey, KeyError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(target: "jwks_guard.auth.resolver", kid = %kid, "Key resolution cancelled");
                Err(KeyError::Cancelled)
            }
            result = self.resolve(kid) => result,
        }
    }
}

//! JWKS client for fetching public keys from the issuer's key-set endpoint.
//!
//! Each call to [`JwksClient::fetch_key`] performs exactly one GET and
//! scans the returned `keys` array for the requested `kid`. There is no
//! caching and no retry here; see [`crate::auth::KeyResolver`].

use crate::auth::decoder::{Base64UrlDecoder, ComponentDecoder};
use crate::auth::public_key::PublicKey;
use crate::config::Config;
use crate::errors::KeyError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Transient parse of a key-set response body.
///
/// Records are kept as raw JSON so that malformed entries can be skipped
/// without rejecting the whole document.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySetDocument {
    pub keys: Vec<Value>,
}

impl KeySetDocument {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Parse` if the body is not JSON or has no `keys` array.
    pub fn parse(body: &[u8]) -> Result<Self, KeyError> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::error!(target: "jwks_guard.auth.jwks", error = %e, "Failed to parse JWKS response");
            KeyError::Parse(e.to_string())
        })
    }

    /// First record whose `kid` equals `kid`, in server order.
    ///
    /// Records that are not objects or whose `kid` is not a string never match.
    pub fn find(&self, kid: &str) -> Option<&Map<String, Value>> {
        self.keys
            .iter()
            .filter_map(Value::as_object)
            .find(|record| record.get("kid").and_then(Value::as_str) == Some(kid))
    }
}

/// Raw HTTP GET against the key-set endpoint.
#[async_trait::async_trait]
pub trait KeySetTransport: Send + Sync {
    /// Fetch the response body at `url`.
    ///
    /// Non-success statuses are reported as `KeyError::Transport`.
    async fn get(&self, url: &str) -> Result<Vec<u8>, KeyError>;
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "jwks_guard.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self { http_client }
    }
}

#[async_trait::async_trait]
impl KeySetTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, KeyError> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!(target: "jwks_guard.auth.jwks", error = %e, "Failed to fetch JWKS");
            KeyError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                target: "jwks_guard.auth.jwks",
                status = %status,
                "JWKS endpoint returned error"
            );
            return Err(KeyError::Transport(format!("Unexpected status: {status}")));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(target: "jwks_guard.auth.jwks", error = %e, "Failed to read JWKS response body");
            KeyError::Transport(e.to_string())
        })?;

        Ok(body.to_vec())
    }
}

/// Source of public keys by `kid`.
#[async_trait::async_trait]
pub trait KeyFetcher: Send + Sync {
    async fn fetch_key(&self, kid: &str) -> Result<PublicKey, KeyError>;
}

/// JWKS client: one GET, linear `kid` scan, component decode.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    certs_url: String,

    transport: Arc<dyn KeySetTransport>,

    decoder: Arc<dyn ComponentDecoder>,
}

impl JwksClient {
    /// Create a client using `reqwest` and the standard base64url decoder.
    ///
    /// # Arguments
    ///
    /// * `certs_url` - URL of the key-set document
    /// * `fetch_timeout` - Timeout for each GET
    pub fn new(certs_url: String, fetch_timeout: Duration) -> Self {
        Self::with_collaborators(
            certs_url,
            Arc::new(ReqwestTransport::new(fetch_timeout)),
            Arc::new(Base64UrlDecoder),
        )
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.certs_url.clone(), config.fetch_timeout)
    }

    /// Create a client with explicit transport and decoder.
    pub fn with_collaborators(
        certs_url: String,
        transport: Arc<dyn KeySetTransport>,
        decoder: Arc<dyn ComponentDecoder>,
    ) -> Self {
        Self {
            certs_url,
            transport,
            decoder,
        }
    }

    pub fn certs_url(&self) -> &str {
        &self.certs_url
    }

    fn decode_component(
        &self,
        record: &Map<String, Value>,
        field: &str,
        kid: &str,
    ) -> Result<num_bigint::BigUint, KeyError> {
        // Absent or non-string components decode as empty, i.e. zero
        let encoded = record.get(field).and_then(Value::as_str).unwrap_or("");

        self.decoder.decode(encoded).map_err(|source| {
            tracing::warn!(target: "jwks_guard.auth.jwks", kid = %kid, field = field, "Invalid JWK component");
            KeyError::Decode {
                kid: kid.to_string(),
                source,
            }
        })
    }
}

#[async_trait::async_trait]
impl KeyFetcher for JwksClient {
    /// Fetch the key set and return the key for `kid`.
    ///
    /// # Errors
    ///
    /// - `KeyError::Transport` - GET failed or returned non-success status
    /// - `KeyError::Parse` - Body is not a key-set document
    /// - `KeyError::KeyNotFound` - No record carries `kid`
    /// - `KeyError::Decode` - The record's `n` or `e` is malformed
    #[instrument(skip_all, fields(kid = %kid))]
    async fn fetch_key(&self, kid: &str) -> Result<PublicKey, KeyError> {
        tracing::debug!(target: "jwks_guard.auth.jwks", url = %self.certs_url, "Fetching JWKS");

        let body = self.transport.get(&self.certs_url).await?;
        let document = KeySetDocument::parse(&body)?;

        let record = document.find(kid).ok_or_else(|| {
            tracing::warn!(
                target: "jwks_guard.auth.jwks",
                kid = %kid,
                key_count = document.keys.len(),
                "Key not found in JWKS"
            );
            KeyError::KeyNotFound {
                kid: kid.to_string(),
            }
        })?;

        let modulus = self.decode_component(record, "n", kid)?;
        let exponent = self.decode_component(record, "e", kid)?;

        let key = PublicKey::from_components(modulus, &exponent).map_err(|source| {
            tracing::warn!(target: "jwks_guard.auth.jwks", kid = %kid, "JWK exponent out of range");
            KeyError::Decode {
                kid: kid.to_string(),
                source,
            }
        })?;

        tracing::info!(target: "jwks_guard.auth.jwks", kid = %kid, "Key fetched from JWKS");
        Ok(key)
    }
}

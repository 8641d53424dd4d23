//! OAuth 2.0 token client.
//!
//! Obtains access/refresh token pairs from the issuer's token endpoint via
//! the resource-owner password grant, and renews them via the refresh-token
//! grant. One POST per call, no retry.
//!
//! # Security
//!
//! - Client secret, passwords and tokens are held as `SecretString`
//! - Token values and error bodies are never logged above trace level

use crate::config::Config;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout for HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while requesting tokens.
#[derive(Error, Debug, Clone)]
pub enum TokenClientError {
    /// HTTP client error.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Token endpoint rejected the request; carries its `error` field.
    #[error("{0}")]
    Rejected(String),

    /// Token response parsing failed.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Access and refresh token returned by the token endpoint.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct OAuthErrorResponse {
    error: String,
}

/// Client for the issuer's token endpoint.
pub struct TokenClient {
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for TokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClient")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenClient {
    /// Create a token client.
    ///
    /// # Errors
    ///
    /// Returns `TokenClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        token_url: String,
        client_id: String,
        client_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, TokenClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                TokenClientError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            token_url,
            client_id,
            client_secret,
            http_client,
        })
    }

    /// Create a token client from the OAuth settings in `config`.
    ///
    /// # Errors
    ///
    /// Returns `TokenClientError::Configuration` if `token_url`, `client_id`
    /// or `client_secret` is not set.
    pub fn from_config(config: &Config) -> Result<Self, TokenClientError> {
        let token_url = config
            .token_url
            .clone()
            .ok_or_else(|| TokenClientError::Configuration("token_url is not set".into()))?;
        let client_id = config
            .client_id
            .clone()
            .ok_or_else(|| TokenClientError::Configuration("client_id is not set".into()))?;
        let client_secret = config
            .client_secret
            .clone()
            .ok_or_else(|| TokenClientError::Configuration("client_secret is not set".into()))?;

        Self::new(token_url, client_id, client_secret, DEFAULT_HTTP_TIMEOUT)
    }

    /// Exchange user credentials for a token pair.
    #[instrument(skip_all, fields(client_id = %self.client_id))]
    pub async fn password_grant(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenPair, TokenClientError> {
        let form = [
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("username", username),
            ("password", password.expose_secret()),
        ];

        self.request_token(&form).await
    }

    /// Exchange a refresh token for a new token pair.
    #[instrument(skip_all, fields(client_id = %self.client_id))]
    pub async fn refresh(
        &self,
        refresh_token: &SecretString,
    ) -> Result<TokenPair, TokenClientError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
        ];

        self.request_token(&form).await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenPair, TokenClientError> {
        debug!(
            target: "jwks_guard.token_client",
            url = %self.token_url,
            "Requesting token"
        );

        let response = self
            .http_client
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                debug!(target: "jwks_guard.token_client", error = %e, "HTTP request failed");
                TokenClientError::Http(e.to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            let token_response: OAuthTokenResponse = response.json().await.map_err(|e| {
                warn!(target: "jwks_guard.token_client", error = %e, "Failed to parse token response");
                TokenClientError::InvalidResponse(e.to_string())
            })?;

            debug!(target: "jwks_guard.token_client", "Token acquired successfully");

            return Ok(TokenPair {
                access_token: SecretString::from(token_response.access_token),
                refresh_token: SecretString::from(token_response.refresh_token),
            });
        }

        let body = response.text().await.unwrap_or_else(|e| {
            trace!(target: "jwks_guard.token_client", error = %e, "Failed to read error response body");
            String::new()
        });
        warn!(
            target: "jwks_guard.token_client",
            status = %status,
            "Token request rejected"
        );
        trace!(target: "jwks_guard.token_client", body = %body, "Token rejection response body");

        let reason = serde_json::from_str::<OAuthErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| format!("Status {status}"));

        Err(TokenClientError::Rejected(reason))
    }
}

//! jwks-guard configuration.
//!
//! Configuration is validated once at construction. It can be loaded
//! from environment variables or assembled directly by the embedder.
//! The OAuth client secret is redacted in Debug output.

use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default key-set fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 10;

pub const ENV_CERTS_URL: &str = "JWKS_GUARD_CERTS_URL";
pub const ENV_JWT_AUD: &str = "JWKS_GUARD_JWT_AUD";
pub const ENV_FETCH_TIMEOUT_SECONDS: &str = "JWKS_GUARD_FETCH_TIMEOUT_SECONDS";
pub const ENV_TOKEN_URL: &str = "JWKS_GUARD_TOKEN_URL";
pub const ENV_CLIENT_ID: &str = "JWKS_GUARD_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "JWKS_GUARD_CLIENT_SECRET";

/// Authentication middleware configuration.
#[derive(Clone)]
pub struct Config {
    /// URL of the JSON Web Key Set document.
    pub certs_url: String,

    /// Expected value of the token's `aud` claim.
    pub audience: String,

    /// Timeout applied to each key-set GET.
    pub fetch_timeout: Duration,

    /// OAuth token endpoint, used only by the token client.
    pub token_url: Option<String>,

    /// OAuth client ID, used only by the token client.
    pub client_id: Option<String>,

    /// OAuth client secret - redacted in Debug output.
    pub client_secret: Option<SecretString>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("certs_url", &self.certs_url)
            .field("audience", &self.audience)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Build a configuration from explicit values with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if either value is empty.
    pub fn new(certs_url: String, audience: String) -> Result<Self, ConfigError> {
        if certs_url.is_empty() {
            return Err(ConfigError::MissingEnvVar(ENV_CERTS_URL.to_string()));
        }
        if audience.is_empty() {
            return Err(ConfigError::MissingEnvVar(ENV_JWT_AUD.to_string()));
        }

        Ok(Self {
            certs_url,
            audience,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
            token_url: None,
            client_id: None,
            client_secret: None,
        })
    }

    /// Set the key-set fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the OAuth client settings used by the token client.
    pub fn with_oauth_client(
        mut self,
        token_url: String,
        client_id: String,
        client_secret: SecretString,
    ) -> Self {
        self.token_url = Some(token_url);
        self.client_id = Some(client_id);
        self.client_secret = Some(client_secret);
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let certs_url = required(vars, ENV_CERTS_URL)?;
        let audience = required(vars, ENV_JWT_AUD)?;

        let fetch_timeout = if let Some(value_str) = vars.get(ENV_FETCH_TIMEOUT_SECONDS) {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "{} must be a valid positive integer, got '{}': {}",
                    ENV_FETCH_TIMEOUT_SECONDS, value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be greater than 0",
                    ENV_FETCH_TIMEOUT_SECONDS
                )));
            }

            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS)
        };

        let token_url = optional(vars, ENV_TOKEN_URL);
        let client_id = optional(vars, ENV_CLIENT_ID);
        let client_secret = optional(vars, ENV_CLIENT_SECRET).map(SecretString::from);

        Ok(Config {
            certs_url,
            audience,
            fetch_timeout,
            token_url,
            client_id,
            client_secret,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    optional(vars, name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name).filter(|v| !v.is_empty()).cloned()
}

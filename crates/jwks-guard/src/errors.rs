//! Error types for key resolution and request authentication.
//!
//! Key resolution errors (`KeyError`) keep full detail for diagnostics.
//! At the HTTP boundary every failure collapses into `AuthError`, which
//! always renders as 401 with a short plaintext body. Internal detail is
//! logged server-side and never sent to the client.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Body sent when the Authorization header is missing or malformed.
pub const HEADER_FORMAT_INVALID: &str = "Authorization header format invalid";

/// Body sent for every other authentication failure.
pub const INVALID_TOKEN: &str = "Invalid token";

/// Failure decoding a base64url big-endian key component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid base64url encoding: {0}")]
    InvalidBase64(String),

    #[error("exponent does not fit in a 64-bit integer")]
    ExponentOverflow,
}

/// Failure resolving a verification key for a `kid`.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key-set endpoint could not be reached or returned a non-success status.
    #[error("Key set transport error: {0}")]
    Transport(String),

    /// The key-set body is not JSON or lacks a `keys` array.
    #[error("Key set parse error: {0}")]
    Parse(String),

    /// No record in the key set carries the requested `kid`.
    #[error("key not found for kid {kid}")]
    KeyNotFound { kid: String },

    /// The matching record's `n` or `e` component is malformed.
    #[error("invalid key component for kid {kid}: {source}")]
    Decode {
        kid: String,
        #[source]
        source: DecodeError,
    },

    /// The caller cancelled the resolution while the fetch was in flight.
    #[error("Key resolution cancelled")]
    Cancelled,
}

/// Authentication failure surfaced by the middleware.
///
/// Both variants map to 401 Unauthorized.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header format invalid")]
    TokenFormat,

    #[error("Invalid token: {0}")]
    Verification(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::TokenFormat | AuthError::Verification(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// The plaintext body returned to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::TokenFormat => HEADER_FORMAT_INVALID,
            AuthError::Verification(_) => INVALID_TOKEN,
        }
    }
}

impl From<KeyError> for AuthError {
    fn from(err: KeyError) -> Self {
        AuthError::Verification(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Verification(reason) = &self {
            // Log actual reason server-side, return generic message to client
            tracing::debug!(target: "jwks_guard.errors", reason = %reason, "Token rejected");
        }

        let mut response = (self.status_code(), self.public_message()).into_response();

        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer error=\"invalid_token\""),
        );

        response
    }
}

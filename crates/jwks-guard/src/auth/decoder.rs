//! Decoding of JWK big-integer components.
//!
//! RSA JWKs carry `n` and `e` as unpadded base64url strings holding the
//! big-endian magnitude of each integer.

use crate::errors::DecodeError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use num_bigint::BigUint;

/// Converts an encoded key component into an unsigned integer.
pub trait ComponentDecoder: Send + Sync {
    /// Decode `encoded` into its integer value.
    fn decode(&self, encoded: &str) -> Result<BigUint, DecodeError>;
}

/// Standard decoder: unpadded base64url, big-endian, unsigned.
///
/// Leading zero bytes do not change the value. Padded input and characters
/// outside the URL-safe alphabet are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64UrlDecoder;

impl ComponentDecoder for Base64UrlDecoder {
    fn decode(&self, encoded: &str) -> Result<BigUint, DecodeError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
            tracing::debug!(target: "jwks_guard.auth.decoder", error = %e, "Invalid base64url component");
            DecodeError::InvalidBase64(e.to_string())
        })?;

        Ok(BigUint::from_bytes_be(&bytes))
    }
}

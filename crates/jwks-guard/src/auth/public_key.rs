//! RSA public key resolved from a JWK.

use crate::errors::DecodeError;
use jsonwebtoken::DecodingKey;
use num_bigint::BigUint;

/// RSA public key: modulus and exponent.
///
/// Immutable once constructed. This is the value stored in the key cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    modulus: BigUint,
    exponent: u64,
}

impl PublicKey {
    pub fn new(modulus: BigUint, exponent: u64) -> Self {
        Self { modulus, exponent }
    }

    /// Build a key from decoded components.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::ExponentOverflow` if `exponent` does not fit in a `u64`.
    pub fn from_components(modulus: BigUint, exponent: &BigUint) -> Result<Self, DecodeError> {
        let exponent = u64::try_from(exponent).map_err(|_| DecodeError::ExponentOverflow)?;
        Ok(Self::new(modulus, exponent))
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn exponent(&self) -> u64 {
        self.exponent
    }

    /// Key in the form the JWT library verifies RS256 signatures with.
    pub fn to_decoding_key(&self) -> DecodingKey {
        let modulus = self.modulus.to_bytes_be();
        let exponent = BigUint::from(self.exponent).to_bytes_be();
        DecodingKey::from_rsa_raw_components(&modulus, &exponent)
    }
}

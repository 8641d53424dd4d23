//! Authentication module.
//!
//! Resolves verification keys from a remote JWKS endpoint and validates
//! RS256 bearer tokens against them.
//!
//! # Components
//!
//! - `decoder` - base64url to big-integer decoding of JWK components
//! - `public_key` - The RSA public key value cached per `kid`
//! - `cache` - The `KeyCache` capability and an in-memory implementation
//! - `jwks` - Key-set fetching and `kid` lookup
//! - `resolver` - Cache-first key resolution
//! - `claims` - Validated token claims
//! - `jwt` - Token validation

pub mod cache;
pub mod claims;
pub mod decoder;
pub mod jwks;
pub mod jwt;
pub mod public_key;
pub mod resolver;

pub use cache::{InMemoryKeyCache, KeyCache};
pub use claims::Claims;
pub use decoder::{Base64UrlDecoder, ComponentDecoder};
pub use jwks::{JwksClient, KeyFetcher, KeySetDocument, KeySetTransport, ReqwestTransport};
pub use jwt::JwtValidator;
pub use public_key::PublicKey;
pub use resolver::KeyResolver;

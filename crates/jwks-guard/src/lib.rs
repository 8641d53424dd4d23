//! jwks-guard: bearer-token authentication against a remote JWKS endpoint.
//!
//! This library authenticates inbound HTTP requests by validating RS256
//! bearer tokens with public keys published at a JSON Web Key Set URL.
//! Keys are resolved by `kid` and cached through an embedder-supplied
//! [`auth::KeyCache`].
//!
//! # Architecture
//!
//! ```text
//! middleware::require_auth -> auth::JwtValidator -> auth::KeyResolver
//!                                                  -> KeyCache (hit)
//!                                                  -> JwksClient -> KeySetTransport + ComponentDecoder (miss)
//! ```
//!
//! # Modules
//!
//! - `auth` - Key decoding, caching, JWKS fetching, resolution and JWT validation
//! - `config` - Configuration from environment or explicit values
//! - `errors` - Error types with HTTP status code mapping
//! - `middleware` - Axum authentication middleware
//! - `token_client` - OAuth 2.0 password and refresh-token grants

pub mod auth;
pub mod config;
pub mod errors;
pub mod middleware;
pub mod token_client;

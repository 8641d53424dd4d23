//! # jwks-guard Test Utilities
//!
//! Shared test utilities for the jwks-guard crate.
//!
//! This crate provides:
//! - Deterministic RSA fixtures (fixed keys with matching JWK components)
//! - Claims builders (TestTokenBuilder)
//! - A mocked key-set endpoint (TestJwksServer)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jwks_guard_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let key = primary_rsa_key("k1");
//!     let server = TestJwksServer::start(vec![key.jwk_json()]).await;
//!
//!     let token = key.sign(
//!         &TestTokenBuilder::new()
//!             .for_user("alice")
//!             .with_audience("orders-api")
//!             .build(),
//!     );
//! }
//! ```

pub mod crypto_fixtures;
pub mod jwks_server;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use jwks_server::*;
pub use token_builders::*;

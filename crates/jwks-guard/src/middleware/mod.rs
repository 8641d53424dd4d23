//! HTTP middleware.
//!
//! # Components
//!
//! - `auth` - Bearer token authentication for protected routes

pub mod auth;

pub use auth::{require_auth, AuthState, AuthenticatedSubject, ClaimsExt};

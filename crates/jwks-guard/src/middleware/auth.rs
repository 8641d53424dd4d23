//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, validates it
//! with [`JwtValidator`], and injects the subject and claims into request
//! extensions. Every failure responds 401 without calling the inner handler.

use crate::auth::{Claims, JwtValidator};
use crate::errors::AuthError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

const BEARER_PREFIX: &str = "Bearer ";

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// JWT validator with key resolver.
    pub jwt_validator: Arc<JwtValidator>,

    /// When cancelled, in-flight key fetches abort and requests are rejected.
    pub shutdown: Option<CancellationToken>,
}

impl AuthState {
    pub fn new(jwt_validator: Arc<JwtValidator>) -> Self {
        Self {
            jwt_validator,
            shutdown: None,
        }
    }

    /// Abort in-flight key resolution when `token` is cancelled.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }
}

/// Verified `sub` claim of the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSubject(pub String);

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The prefix must match exactly, including case and the single space.
///
/// # Errors
///
/// Returns `AuthError::TokenFormat` if the header is missing, not valid
/// ASCII, or lacks the `Bearer ` prefix.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "jwks_guard.middleware.auth", "Missing Authorization header");
            AuthError::TokenFormat
        })?;

    auth_header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        tracing::debug!(target: "jwks_guard.middleware.auth", "Invalid Authorization header format");
        AuthError::TokenFormat
    })
}

/// Authentication middleware that validates JWT tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 `Authorization header format invalid` if the header is missing or malformed
/// - 401 `Invalid token` if the token fails validation for any reason
/// - Otherwise continues to the next handler with `AuthenticatedSubject`
///   and `Claims` in extensions
#[instrument(skip(state, req, next), name = "jwks_guard.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    let token = bearer_token(req.headers())?;

    let claims = match &state.shutdown {
        Some(cancel) => {
            state
                .jwt_validator
                .validate_cancellable(token, cancel)
                .await?
        }
        None => state.jwt_validator.validate(token).await?,
    };

    req.extensions_mut()
        .insert(AuthenticatedSubject(claims.sub.clone()));
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Typed access to authentication results from request extensions.
pub trait ClaimsExt {
    /// `None` if the auth middleware was not applied to this request.
    fn claims(&self) -> Option<&Claims>;

    fn subject(&self) -> Option<&str>;
}

impl<B> ClaimsExt for axum::http::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }

    fn subject(&self) -> Option<&str> {
        self.extensions()
            .get::<AuthenticatedSubject>()
            .map(|s| s.0.as_str())
    }
}

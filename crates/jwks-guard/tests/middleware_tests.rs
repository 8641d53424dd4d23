//! End-to-end tests for the `require_auth` middleware.
//!
//! Each test builds an axum router guarded by the middleware, backed by a
//! mocked key-set endpoint and tokens signed with fixture RSA keys.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Extension, Router,
};
use http_body_util::BodyExt;
use jwks_guard::auth::{InMemoryKeyCache, JwtValidator, KeyCache};
use jwks_guard::config::Config;
use jwks_guard::middleware::{require_auth, AuthState, AuthenticatedSubject, ClaimsExt};
use jwks_guard_test_utils::{
    primary_rsa_key, secondary_rsa_key, sign_hs256, TestJwksServer, TestRsaKey, TestTokenBuilder,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const AUDIENCE: &str = "meeting-api";
const KID: &str = "k1";

struct TestApp {
    server: TestJwksServer,
    cache: Arc<InMemoryKeyCache>,
    handler_calls: Arc<AtomicUsize>,
    router: Router,
    signing_key: TestRsaKey,
}

impl TestApp {
    async fn spawn() -> Self {
        Self::spawn_with_shutdown(None).await
    }

    async fn spawn_with_shutdown(shutdown: Option<CancellationToken>) -> Self {
        let signing_key = primary_rsa_key(KID);
        let server = TestJwksServer::start(vec![signing_key.jwk_json()]).await;

        let config = Config::new(server.certs_url(), AUDIENCE.to_string()).unwrap();
        let cache = Arc::new(InMemoryKeyCache::new());
        let validator = Arc::new(JwtValidator::from_config(&config, cache.clone()));

        let mut state = AuthState::new(validator);
        if let Some(token) = shutdown {
            state = state.with_shutdown(token);
        }

        let handler_calls = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&handler_calls);

        let router = Router::new()
            .route(
                "/whoami",
                get(move |Extension(subject): Extension<AuthenticatedSubject>| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        subject.0
                    }
                }),
            )
            .route(
                "/claims",
                get(|req: Request| async move {
                    let claims = req.claims().cloned();
                    claims
                        .and_then(|c| c.aud)
                        .unwrap_or_else(|| "none".to_string())
                }),
            )
            .layer(middleware::from_fn_with_state(Arc::new(state), require_auth));

        Self {
            server,
            cache,
            handler_calls,
            router,
            signing_key,
        }
    }

    fn valid_claims(&self) -> Value {
        TestTokenBuilder::new()
            .for_user("alice")
            .with_audience(AUDIENCE)
            .build()
    }

    async fn get_with_auth(&self, uri: &str, authorization: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = builder.body(Body::empty()).unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get_with_token(&self, token: &str) -> Response {
        self.get_with_auth("/whoami", Some(&format!("Bearer {token}")))
            .await
    }

    fn handler_calls(&self) -> usize {
        self.handler_calls.load(Ordering::SeqCst)
    }
}

async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn assert_invalid_token(response: Response) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(body_string(response).await, "Invalid token");
}

// ============================================================================
// Accepted requests
// ============================================================================

#[tokio::test]
async fn test_valid_token_is_forwarded_with_subject() {
    let app = TestApp::spawn().await;
    let token = app.signing_key.sign(&app.valid_claims());

    let response = app.get_with_token(&token).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "alice");
    assert_eq!(app.handler_calls(), 1);
    assert_eq!(app.server.fetch_count().await, 1);
    assert!(app.cache.get(KID).await.is_some());
}

#[tokio::test]
async fn test_cached_key_serves_later_requests_without_fetch() {
    let app = TestApp::spawn().await;
    let token = app.signing_key.sign(&app.valid_claims());

    for _ in 0..3 {
        let response = app.get_with_token(&token).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.handler_calls(), 3);
    assert_eq!(app.server.fetch_count().await, 1);
}

#[tokio::test]
async fn test_claims_are_available_to_handlers() {
    let app = TestApp::spawn().await;
    let token = app.signing_key.sign(&app.valid_claims());

    let response = app
        .get_with_auth("/claims", Some(&format!("Bearer {token}")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, AUDIENCE);
}

#[tokio::test]
async fn test_token_without_expiry_is_accepted() {
    let app = TestApp::spawn().await;
    let claims = TestTokenBuilder::new()
        .for_user("alice")
        .with_audience(AUDIENCE)
        .without_expiry()
        .build();

    let response = app.get_with_token(&app.signing_key.sign(&claims)).await;

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Header format rejections
// ============================================================================

#[tokio::test]
async fn test_malformed_authorization_header_is_rejected_without_fetch() {
    let app = TestApp::spawn().await;
    let token = app.signing_key.sign(&app.valid_claims());

    let cases = [
        None,
        Some(token.clone()),
        Some(format!("bearer {token}")),
        Some(format!("Basic {token}")),
        Some(format!("Bearer{token}")),
    ];

    for case in cases {
        let response = app.get_with_auth("/whoami", case.as_deref()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{:?}", case);
        assert_eq!(
            body_string(response).await,
            "Authorization header format invalid"
        );
    }

    assert_eq!(app.handler_calls(), 0);
    assert_eq!(app.server.fetch_count().await, 0);
}

// ============================================================================
// Validation rejections
// ============================================================================

#[tokio::test]
async fn test_audience_mismatch_is_rejected() {
    let app = TestApp::spawn().await;
    let claims = TestTokenBuilder::new()
        .for_user("alice")
        .with_audience("other-api")
        .build();

    let response = app.get_with_token(&app.signing_key.sign(&claims)).await;

    assert_invalid_token(response).await;
    assert_eq!(app.handler_calls(), 0);
}

#[tokio::test]
async fn test_missing_audience_is_rejected() {
    let app = TestApp::spawn().await;
    let claims = TestTokenBuilder::new().for_user("alice").build();

    let response = app.get_with_token(&app.signing_key.sign(&claims)).await;

    assert_invalid_token(response).await;
}

#[tokio::test]
async fn test_audience_array_is_rejected() {
    let app = TestApp::spawn().await;
    let claims = TestTokenBuilder::new()
        .for_user("alice")
        .with_audiences(&[AUDIENCE, "other-api"])
        .build();

    let response = app.get_with_token(&app.signing_key.sign(&claims)).await;

    assert_invalid_token(response).await;
    assert_eq!(app.handler_calls(), 0);
}

#[tokio::test]
async fn test_signature_from_wrong_key_is_rejected() {
    let app = TestApp::spawn().await;
    // Same kid as the published key, different private key
    let forger = secondary_rsa_key(KID);
    let token = forger.sign(&app.valid_claims());

    let response = app.get_with_token(&token).await;

    assert_invalid_token(response).await;
    assert_eq!(app.handler_calls(), 0);
}

#[tokio::test]
async fn test_unknown_kid_is_rejected_and_not_cached() {
    let app = TestApp::spawn().await;
    let token = primary_rsa_key("rotated-away").sign(&app.valid_claims());

    let response = app.get_with_token(&token).await;

    assert_invalid_token(response).await;
    assert_eq!(app.server.fetch_count().await, 1);
    assert!(app.cache.is_empty().await);
}

#[tokio::test]
async fn test_token_without_kid_is_rejected_without_fetch() {
    let app = TestApp::spawn().await;
    let token = app.signing_key.sign_with_kid(&app.valid_claims(), None);

    let response = app.get_with_token(&token).await;

    assert_invalid_token(response).await;
    assert_eq!(app.server.fetch_count().await, 0);
}

#[tokio::test]
async fn test_hs256_token_is_rejected_without_fetch() {
    let app = TestApp::spawn().await;
    let token = sign_hs256(&app.valid_claims(), KID, b"shared-secret");

    let response = app.get_with_token(&token).await;

    assert_invalid_token(response).await;
    assert_eq!(app.server.fetch_count().await, 0);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::spawn().await;
    let claims = TestTokenBuilder::new()
        .for_user("alice")
        .with_audience(AUDIENCE)
        .expires_in(-3600)
        .build();

    let response = app.get_with_token(&app.signing_key.sign(&claims)).await;

    assert_invalid_token(response).await;
}

#[tokio::test]
async fn test_not_yet_valid_token_is_rejected() {
    let app = TestApp::spawn().await;
    let claims = TestTokenBuilder::new()
        .for_user("alice")
        .with_audience(AUDIENCE)
        .not_before_in(3600)
        .build();

    let response = app.get_with_token(&app.signing_key.sign(&claims)).await;

    assert_invalid_token(response).await;
}

#[tokio::test]
async fn test_token_without_subject_is_rejected() {
    let app = TestApp::spawn().await;
    let claims = TestTokenBuilder::new()
        .without_subject()
        .with_audience(AUDIENCE)
        .build();

    let response = app.get_with_token(&app.signing_key.sign(&claims)).await;

    assert_invalid_token(response).await;
    assert_eq!(app.handler_calls(), 0);
}

#[tokio::test]
async fn test_oversized_token_is_rejected_without_fetch() {
    let app = TestApp::spawn().await;
    let token = "a".repeat(9000);

    let response = app.get_with_token(&token).await;

    assert_invalid_token(response).await;
    assert_eq!(app.server.fetch_count().await, 0);
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.get_with_token("not-a-jwt").await;

    assert_invalid_token(response).await;
    assert_eq!(app.server.fetch_count().await, 0);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_cancelled_shutdown_rejects_before_fetch() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let app = TestApp::spawn_with_shutdown(Some(shutdown)).await;
    let token = app.signing_key.sign(&app.valid_claims());

    let response = app.get_with_token(&token).await;

    assert_invalid_token(response).await;
    assert_eq!(app.handler_calls(), 0);
    assert_eq!(app.server.fetch_count().await, 0);
}

#[tokio::test]
async fn test_shutdown_refuses_requests_with_cached_keys() {
    let shutdown = CancellationToken::new();
    let app = TestApp::spawn_with_shutdown(Some(shutdown.clone())).await;
    let token = app.signing_key.sign(&app.valid_claims());

    assert_eq!(app.get_with_token(&token).await.status(), StatusCode::OK);
    shutdown.cancel();

    // Biased toward cancellation, so even cache hits are refused
    let response = app.get_with_token(&token).await;
    assert_invalid_token(response).await;
    assert_eq!(app.server.fetch_count().await, 1);
}

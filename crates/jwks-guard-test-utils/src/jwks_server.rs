//! Mocked key-set endpoint for E2E testing
//!
//! Provides `TestJwksServer`, a wiremock server answering `GET /certs`.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the key set is served from.
pub const CERTS_PATH: &str = "/certs";

/// Mock JWKS server.
///
/// # Example
/// ```rust,ignore
/// let server = TestJwksServer::start(vec![primary_rsa_key("k1").jwk_json()]).await;
/// let client = JwksClient::new(server.certs_url(), Duration::from_secs(5));
/// // ... exercise the client ...
/// assert_eq!(server.fetch_count().await, 1);
/// ```
pub struct TestJwksServer {
    mock_server: MockServer,
}

impl TestJwksServer {
    /// Serve `{"keys": keys}` with status 200.
    pub async fn start(keys: Vec<Value>) -> Self {
        Self::start_with_response(ResponseTemplate::new(200).set_body_json(json!({ "keys": keys })))
            .await
    }

    /// Serve an arbitrary response at the certs path.
    pub async fn start_with_response(response: ResponseTemplate) -> Self {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(CERTS_PATH))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        Self { mock_server }
    }

    /// Full URL of the key-set document.
    pub fn certs_url(&self) -> String {
        format!("{}{}", self.mock_server.uri(), CERTS_PATH)
    }

    /// Number of key-set GETs received so far.
    pub async fn fetch_count(&self) -> usize {
        self.mock_server
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.url.path() == CERTS_PATH)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn mock_server(&self) -> &MockServer {
        &self.mock_server
    }
}

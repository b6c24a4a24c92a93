// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the Resona backend API.
//!
//! Provides [`ApiClient`], the single request helper every other component
//! goes through: it attaches the bearer token when one is set, sends and
//! expects JSON, and normalizes failures into [`ResonaError`] kinds. There is
//! deliberately no retry loop and no backoff here -- backoff lives in the
//! rate-limit model, which refuses to dispatch until a bucket heals.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use resona_core::ResonaError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Server `detail` prefix indicating the credential cache is cold and the
/// call must be retried with the user's password.
const PASSWORD_REQUIRED_DETAIL: &str = "password required";

/// HTTP client for backend communication.
///
/// The bearer token lives in an [`ArcSwapOption`] so every component reads it
/// lock-free; only sign-in and sign-out write it.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: ArcSwapOption<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.load().as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl ApiClient {
    /// Creates a new API client against `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ResonaError> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ResonaError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: ArcSwapOption::empty(),
        })
    }

    /// Store the bearer token attached to subsequent requests.
    pub fn set_token(&self, token: String) {
        self.token.store(Some(Arc::new(token)));
    }

    /// Drop the bearer token. Subsequent requests carry no Authorization header.
    pub fn clear_token(&self) {
        self.token.store(None);
    }

    /// True when a bearer token is currently set.
    pub fn has_token(&self) -> bool {
        self.token.load().is_some()
    }

    /// The current bearer token, for session persistence.
    pub fn token(&self) -> Option<String> {
        self.token.load_full().map(|t| t.as_ref().clone())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.token.load_full() {
            builder = builder.bearer_auth(token.as_str());
        }
        builder
    }

    /// GET `path` and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ResonaError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(transport_error)?;
        decode(path, response).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ResonaError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, path)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        decode(path, response).await
    }

    /// POST to `path` with an empty body and decode the JSON response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ResonaError> {
        let response = self
            .request(Method::POST, path)
            .send()
            .await
            .map_err(transport_error)?;
        decode(path, response).await
    }

    /// DELETE `path` and decode the JSON response.
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ResonaError> {
        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(transport_error)?;
        decode(path, response).await
    }
}

fn transport_error(e: reqwest::Error) -> ResonaError {
    ResonaError::Transport {
        message: format!("HTTP request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Decode a response, normalizing non-2xx statuses into error kinds.
async fn decode<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, ResonaError> {
    let status = response.status();
    let retry_after = retry_after_secs(response.headers());
    let body = response.text().await.map_err(|e| ResonaError::Transport {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;

    debug!(path, status = %status, "response received");

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| ResonaError::Transport {
            message: format!("failed to parse server response: {e}"),
            source: Some(Box::new(e)),
        });
    }

    let detail = extract_detail(&body, status);
    match status {
        StatusCode::UNAUTHORIZED => Err(ResonaError::AuthRequired),
        StatusCode::TOO_MANY_REQUESTS => Err(ResonaError::RateLimited {
            operation: detail,
            retry_after_secs: retry_after,
        }),
        _ if detail
            .to_ascii_lowercase()
            .starts_with(PASSWORD_REQUIRED_DETAIL) =>
        {
            Err(ResonaError::VaultPasswordRequired)
        }
        _ => Err(ResonaError::Api {
            status: status.as_u16(),
            detail,
        }),
    }
}

/// Pull the server's `detail` field out of an error body, falling back to the
/// status line when the body is not JSON or carries no detail.
fn extract_detail(body: &str, status: StatusCode) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string())
    };

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => fallback(),
        },
        Err(_) => fallback(),
    }
}

fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Pong {
        ok: bool,
    }

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn bearer_header_attached_when_token_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.set_token("tok-123".into());
        let pong: Pong = client.get_json("/ping").await.unwrap();
        assert!(pong.ok);
    }

    #[tokio::test]
    async fn no_authorization_header_after_token_cleared() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.set_token("tok-123".into());
        client.clear_token();
        let _: Pong = client.get_json("/ping").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn status_401_maps_to_auth_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secret"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"detail": "token expired"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result: Result<Pong, _> = client.get_json("/secret").await;
        assert!(matches!(result, Err(ResonaError::AuthRequired)));
    }

    #[tokio::test]
    async fn password_required_detail_maps_to_vault_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/op"))
            .respond_with(ResponseTemplate::new(400).set_body_json(
                serde_json::json!({"detail": "password required to unlock stored credentials"}),
            ))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result: Result<Pong, _> = client.post_json("/op", &serde_json::json!({})).await;
        assert!(matches!(result, Err(ResonaError::VaultPasswordRequired)));
    }

    #[tokio::test]
    async fn error_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"detail": "tweet_url is malformed"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.get_json::<Pong>("/bad").await.unwrap_err();
        match err {
            ResonaError::Api { status, detail } => {
                assert_eq!(status, 422);
                assert_eq!(detail, "tweet_url is malformed");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_falls_back_to_status_line() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oops"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.get_json::<Pong>("/oops").await.unwrap_err();
        match err {
            ResonaError::Api { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, "Bad Gateway");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_body_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weird"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.get_json::<Pong>("/weird").await.unwrap_err();
        assert!(matches!(err, ResonaError::Transport { .. }));
    }

    #[tokio::test]
    async fn status_429_maps_to_rate_limited_with_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "42")
                    .set_body_json(serde_json::json!({"detail": "like budget exhausted"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.get_json::<Pong>("/limited").await.unwrap_err();
        match err {
            ResonaError::RateLimited {
                operation,
                retry_after_secs,
            } => {
                assert_eq!(operation, "like budget exhausted");
                assert_eq!(retry_after_secs, 42);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }
}

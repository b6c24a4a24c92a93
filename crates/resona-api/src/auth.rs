// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sign-in / sign-out endpoints and their wire types.

use resona_core::ResonaError;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;

/// Body of `POST /api/auth/login`. The password only lives as long as this
/// request value; `Debug` output redacts it.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// The signed-in user's profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Response of `POST /api/auth/login`.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("user", &self.user)
            .finish()
    }
}

/// Generic `{ok}` acknowledgement used by logout and vault mutations.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl ApiClient {
    /// Sign in. The only unauthenticated call in the API.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ResonaError> {
        self.post_json("/api/auth/login", request).await
    }

    /// Sign out, invalidating the bearer token server-side.
    pub async fn logout(&self) -> Result<Ack, ResonaError> {
        self.post_empty("/api/auth/logout").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn login_sends_credentials_and_returns_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(
                serde_json::json!({"email": "a@b.test", "password": "hunter22"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-1",
                "refresh_token": "rt-1",
                "user": {"id": "u1", "username": "alice"}
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let response = client
            .login(&LoginRequest {
                email: "a@b.test".into(),
                password: "hunter22".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.access_token, "at-1");
        assert_eq!(response.user.username, "alice");
        assert_eq!(response.user.email, None);
    }

    #[test]
    fn login_request_debug_redacts_password() {
        let request = LoginRequest {
            email: "a@b.test".into(),
            password: "hunter22".into(),
        };
        let output = format!("{request:?}");
        assert!(!output.contains("hunter22"));
        assert!(output.contains("[redacted]"));
    }

    #[test]
    fn login_response_debug_redacts_tokens() {
        let response = LoginResponse {
            access_token: "at-secret".into(),
            refresh_token: "rt-secret".into(),
            user: UserProfile {
                id: "u1".into(),
                username: "alice".into(),
                email: None,
            },
        };
        let output = format!("{response:?}");
        assert!(!output.contains("at-secret"));
        assert!(!output.contains("rt-secret"));
        assert!(output.contains("alice"));
    }
}

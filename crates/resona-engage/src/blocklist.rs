// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocked-user list client.
//!
//! The list lives server-side; the panel caches the usernames so analysis
//! results can be filtered before display.

use chrono::{DateTime, Utc};
use resona_core::ResonaError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::EngagePanel;

/// One blocked user.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockedUser {
    pub username: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct BlocklistEnvelope {
    #[allow(dead_code)]
    success: bool,
    blacklisted_users: Vec<BlockedUser>,
}

#[derive(Serialize)]
struct BlockRequest<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl EngagePanel {
    /// Fetch the blocked-user list and refresh the local filter cache.
    pub async fn blocklist(&self) -> Result<Vec<BlockedUser>, ResonaError> {
        let envelope: BlocklistEnvelope =
            match self.api.get_json("/api/automation/blacklist").await {
                Ok(env) => env,
                Err(e) => return Err(self.fail(e).await),
            };
        self.cache_blocklist(&envelope.blacklisted_users).await;
        Ok(envelope.blacklisted_users)
    }

    /// Add a user to the blocked list.
    pub async fn block(
        &self,
        username: &str,
        reason: Option<&str>,
    ) -> Result<Vec<BlockedUser>, ResonaError> {
        let username = username.trim_start_matches('@').trim();
        if username.is_empty() {
            return Err(ResonaError::Validation("enter a username".to_string()));
        }
        let envelope: BlocklistEnvelope = match self
            .api
            .post_json(
                "/api/automation/blacklist",
                &BlockRequest { username, reason },
            )
            .await
        {
            Ok(env) => env,
            Err(e) => return Err(self.fail(e).await),
        };
        info!(username, "user blocked");
        self.cache_blocklist(&envelope.blacklisted_users).await;
        Ok(envelope.blacklisted_users)
    }

    /// Remove a user from the blocked list.
    pub async fn unblock(&self, username: &str) -> Result<Vec<BlockedUser>, ResonaError> {
        let username = username.trim_start_matches('@').trim();
        if username.is_empty() {
            return Err(ResonaError::Validation("enter a username".to_string()));
        }
        let envelope: BlocklistEnvelope = match self
            .api
            .delete_json(&format!("/api/automation/blacklist/{username}"))
            .await
        {
            Ok(env) => env,
            Err(e) => return Err(self.fail(e).await),
        };
        info!(username, "user unblocked");
        self.cache_blocklist(&envelope.blacklisted_users).await;
        Ok(envelope.blacklisted_users)
    }

    async fn cache_blocklist(&self, users: &[BlockedUser]) {
        let mut state = self.state.lock().await;
        state.blocklist = users.iter().map(|u| u.username.clone()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_api::ApiClient;
    use resona_core::SystemClock;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn panel(server: &MockServer) -> EngagePanel {
        let api = Arc::new(ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap());
        api.set_token("tok".into());
        EngagePanel::new(api, Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn block_sends_username_and_caches_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/automation/blacklist"))
            .and(body_json(
                serde_json::json!({"username": "spammer", "reason": "spam replies"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "blacklisted_users": [{"username": "spammer", "reason": "spam replies"}]
            })))
            .mount(&server)
            .await;

        let panel = panel(&server);
        let users = panel.block("@spammer", Some("spam replies")).await.unwrap();
        assert_eq!(users.len(), 1);

        let state = panel.state.lock().await;
        assert!(state.blocklist.contains("spammer"));
    }

    #[tokio::test]
    async fn empty_username_fails_without_network_call() {
        let server = MockServer::start().await;
        let panel = panel(&server);
        let result = panel.block("@", None).await;
        assert!(matches!(result, Err(ResonaError::Validation(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unblock_hits_the_delete_route() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/automation/blacklist/spammer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "blacklisted_users": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let panel = panel(&server);
        let users = panel.unblock("spammer").await.unwrap();
        assert!(users.is_empty());
    }
}

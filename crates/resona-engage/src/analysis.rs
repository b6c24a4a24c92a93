// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engager analysis orchestration.
//!
//! Turns one tweet URL into a ranked list of candidate (user, latest-post,
//! score) records. Exactly one engager-fetch credit and one server-side
//! scoring pass per call; the server fetches the engaging users, pulls each
//! user's most recent post, and scores it. Never retries on its own -- a
//! second user press is required.

use std::sync::LazyLock;

use regex::Regex;
use resona_core::{ActionKind, ResonaError, TweetId, UserId};
use resona_limits::OpKind;
use resona_vault::UnlockTicket;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::EngagePanel;
use crate::dispatch::DispatchPhase;
use crate::selection::Selection;

static TWEET_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(www\.)?(twitter|x)\.com/[A-Za-z0-9_]{1,15}/status/[0-9]+(\?\S*)?$")
        .expect("tweet URL pattern is valid")
});

/// Display-only risk tier derived from the AI score. Selection uses the
/// recommended action as authoritative, never this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            RiskTier::Low
        } else if score >= 0.6 {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        };
        write!(f, "{s}")
    }
}

/// One recent post of an engager.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentTweet {
    pub id: TweetId,
    pub text: String,
}

/// A scored engager. Always has at least one recent tweet; immutable once
/// produced.
#[derive(Debug, Clone)]
pub struct Engager {
    pub user_id: UserId,
    pub username: String,
    /// Ordered by recency; the first entry is the action target.
    pub recent_tweets: Vec<RecentTweet>,
    /// In `[0, 1]`.
    pub ai_score: f64,
    /// Ordered by preference; the first entry drives dispatch.
    pub recommended_actions: Vec<ActionKind>,
    pub risk: RiskTier,
}

/// One completed analysis. Selections are bound to its `id`; a newer
/// analysis invalidates them.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub id: u64,
    pub tweet_url: String,
    pub engagers: Vec<Engager>,
    pub total_engagement_count: u64,
}

// Wipes the inlined password when the request value drops.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct AnalyzeRequest {
    tweet_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecentTweetWire {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzedUserWire {
    user_id: String,
    username: String,
    #[serde(default)]
    recent_tweets: Vec<RecentTweetWire>,
    ai_score: f64,
    #[serde(default)]
    recommended_actions: Vec<ActionKind>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[allow(dead_code)]
    success: bool,
    analyzed_users: Vec<AnalyzedUserWire>,
    total_engagement_count: u64,
}

impl EngagePanel {
    /// Run the analyze-engagers pipeline for `tweet_url`.
    ///
    /// Pre-flight: the URL must parse and the engager-fetch bucket must have
    /// budget; both are checked before any network call. Pass a ticket when
    /// the vault cache is cold. Engagers with no recent post, and engagers
    /// on the blocked list, are dropped from the result rather than surfaced
    /// as errors.
    pub async fn analyze(
        &self,
        tweet_url: &str,
        ticket: Option<UnlockTicket>,
    ) -> Result<Analysis, ResonaError> {
        let tweet_url = tweet_url.trim();
        if !TWEET_URL.is_match(tweet_url) {
            return Err(ResonaError::Validation(
                "enter a full tweet URL like https://x.com/user/status/123".to_string(),
            ));
        }

        {
            let mut state = self.state.lock().await;
            self.refresh_countdown(&mut state);
            let bucket = state.limits.bucket(OpKind::EngagerFetch);
            if !bucket.can_make_request() {
                let err = ResonaError::RateLimited {
                    operation: OpKind::EngagerFetch.to_string(),
                    retry_after_secs: bucket.next_available_seconds,
                };
                state.last_error = Some(err.to_string());
                self.publish(&state);
                return Err(err);
            }
        }

        let request = AnalyzeRequest {
            tweet_url: tweet_url.to_string(),
            user_password: ticket.map(|t| t.into_password().expose_secret().to_string()),
        };
        let response: AnalyzeResponse = match self
            .api
            .post_json("/api/automation/analyze-engaging-users", &request)
            .await
        {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e).await),
        };

        let mut state = self.state.lock().await;
        let total_returned = response.analyzed_users.len();
        let engagers: Vec<Engager> = response
            .analyzed_users
            .into_iter()
            .filter(|user| !user.recent_tweets.is_empty())
            .filter(|user| !state.blocklist.contains(&user.username))
            .map(|user| Engager {
                user_id: UserId(user.user_id),
                username: user.username,
                recent_tweets: user
                    .recent_tweets
                    .into_iter()
                    .map(|t| RecentTweet {
                        id: TweetId(t.id),
                        text: t.text,
                    })
                    .collect(),
                risk: RiskTier::from_score(user.ai_score),
                ai_score: user.ai_score,
                recommended_actions: user.recommended_actions,
            })
            .collect();
        debug!(
            returned = total_returned,
            kept = engagers.len(),
            "analysis results filtered"
        );

        state.limits.deduct(OpKind::EngagerFetch, 1);
        state.counters.processed_users += engagers.len() as u64;
        state.counters.total_analyzed += 1;

        let analysis = Analysis {
            id: state.next_analysis_id(),
            tweet_url: tweet_url.to_string(),
            engagers,
            total_engagement_count: response.total_engagement_count,
        };
        state.analysis = Some(analysis.clone());
        // Selections are tied to a single analysis identity.
        state.selection = Selection::for_analysis(analysis.id);
        state.phase = DispatchPhase::Idle;
        state.last_error = None;
        self.publish(&state);
        info!(
            analysis_id = analysis.id,
            candidates = analysis.engagers.len(),
            "analysis completed"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_api::ApiClient;
    use resona_core::SystemClock;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn panel(server: &MockServer) -> EngagePanel {
        let api = Arc::new(ApiClient::new(server.uri(), Duration::from_secs(5)).unwrap());
        api.set_token("tok".into());
        EngagePanel::new(api, Arc::new(SystemClock))
    }

    fn analyze_body() -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "analyzed_users": [
                {
                    "user_id": "100", "username": "with_posts",
                    "recent_tweets": [{"id": "t1", "text": "hello"}],
                    "ai_score": 0.92, "recommended_actions": ["like"]
                },
                {
                    "user_id": "200", "username": "no_posts",
                    "recent_tweets": [],
                    "ai_score": 0.7, "recommended_actions": ["like"]
                },
                {
                    "user_id": "300", "username": "mid_score",
                    "recent_tweets": [{"id": "t3", "text": "hey"}],
                    "ai_score": 0.65, "recommended_actions": ["repost", "like"]
                }
            ],
            "total_engagement_count": 3
        })
    }

    #[test]
    fn risk_tiers_from_score() {
        assert_eq!(RiskTier::from_score(0.9), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.8), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(0.6), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(0.59), RiskTier::High);
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_without_network_call() {
        let server = MockServer::start().await;
        let panel = panel(&server);

        for url in [
            "x.com/user/status/1",
            "https://example.com/user/status/1",
            "https://x.com/user",
            "",
        ] {
            let result = panel.analyze(url, None).await;
            assert!(matches!(result, Err(ResonaError::Validation(_))), "url: {url}");
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn engagers_without_recent_posts_are_dropped_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/automation/analyze-engaging-users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(analyze_body()))
            .mount(&server)
            .await;

        let panel = panel(&server);
        let analysis = panel
            .analyze("https://x.com/someone/status/42", None)
            .await
            .unwrap();

        assert_eq!(analysis.engagers.len(), 2);
        assert!(analysis.engagers.iter().all(|e| !e.recent_tweets.is_empty()));
        assert_eq!(analysis.total_engagement_count, 3);
    }

    #[tokio::test]
    async fn analysis_spends_one_engager_fetch_credit_and_bumps_counters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/automation/analyze-engaging-users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(analyze_body()))
            .mount(&server)
            .await;

        let panel = panel(&server);
        panel
            .analyze("https://x.com/someone/status/42", None)
            .await
            .unwrap();

        let snap = panel.snapshot().await;
        assert_eq!(snap.limits.bucket(OpKind::EngagerFetch).short_used, 1);
        assert_eq!(snap.counters.total_analyzed, 1);
        assert_eq!(snap.counters.processed_users, 2);
    }

    #[tokio::test]
    async fn empty_engager_fetch_bucket_refuses_before_any_call() {
        let server = MockServer::start().await;
        let panel = panel(&server);
        {
            let mut state = panel.state.lock().await;
            // Exhaust the short window.
            for _ in 0..75 {
                state.limits.deduct(OpKind::EngagerFetch, 1);
            }
        }

        let result = panel.analyze("https://x.com/someone/status/42", None).await;
        match result {
            Err(ResonaError::RateLimited { operation, .. }) => {
                assert_eq!(operation, "engager_fetch");
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_leaves_state_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/automation/analyze-engaging-users"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"detail": "scoring backend down"})),
            )
            .mount(&server)
            .await;

        let panel = panel(&server);
        let result = panel.analyze("https://x.com/someone/status/42", None).await;
        assert!(result.is_err());

        let snap = panel.snapshot().await;
        // No credit spent, no counters bumped, error surfaced.
        assert_eq!(snap.limits.bucket(OpKind::EngagerFetch).short_used, 0);
        assert_eq!(snap.counters.total_analyzed, 0);
        assert!(snap.last_error.unwrap().contains("scoring backend down"));
    }
}

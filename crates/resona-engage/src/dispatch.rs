// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch dispatch of selected actions.
//!
//! Pipeline: derive candidates from the selection, project every partition
//! against its bucket, refuse the whole batch on any shortfall, POST, then
//! merge results into the local queue and deduct budget only for entries the
//! server reports as successful. The phase machine is
//! `idle -> prompting_password? -> projecting -> submitting -> merging ->
//! idle`; any step may fail back to `idle` with the error surfaced, and a
//! cancelled password prompt returns to `idle` with no side effects.

use resona_core::{ActionKind, ResonaError, TweetId, UserId};
use resona_limits::OpKind;
use resona_vault::UnlockTicket;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::EngagePanel;
use crate::analysis::Analysis;
use crate::queue::QueuedAction;
use crate::selection::Selection;

/// Phase of the dispatch state machine, published for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPhase {
    #[default]
    Idle,
    PromptingPassword,
    Projecting,
    Submitting,
    Merging,
}

/// One action derived from a selected engager, ready to send.
///
/// Invariant: `target_tweet_id` is the most recent post of `target_user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAction {
    pub target_user_id: UserId,
    pub target_username: String,
    pub target_tweet_id: TweetId,
    pub action_type: ActionKind,
    pub confidence: f64,
    pub reasoning: String,
}

/// Outcome of one dispatch, for the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub executed: u32,
    pub failed: u32,
    /// `(username, error)` for every failed item, in server order.
    pub failures: Vec<(String, String)>,
}

// Wipes the inlined password when the request value drops.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct ExecuteRequest {
    #[zeroize(skip)]
    selected_actions: Vec<CandidateAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExecutedActionWire {
    action_type: ActionKind,
    #[allow(dead_code)]
    target_user_id: String,
    target_username: String,
    #[allow(dead_code)]
    target_tweet_id: String,
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    content_preview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[allow(dead_code)]
    success: bool,
    executed_count: u32,
    results: Vec<ExecutedActionWire>,
}

/// Join the selection with the analysis, in analysis order. The action type
/// is the engager's first recommended action; engagers with no
/// recommendation are skipped.
pub(crate) fn derive_candidates(analysis: &Analysis, selection: &Selection) -> Vec<CandidateAction> {
    analysis
        .engagers
        .iter()
        .filter(|engager| selection.contains(&engager.user_id))
        .filter_map(|engager| {
            let action_type = *engager.recommended_actions.first()?;
            let latest = engager.recent_tweets.first()?;
            Some(CandidateAction {
                target_user_id: engager.user_id.clone(),
                target_username: engager.username.clone(),
                target_tweet_id: latest.id.clone(),
                action_type,
                confidence: engager.ai_score,
                reasoning: format!(
                    "recommended {} (score {:.2}, {} risk)",
                    action_type, engager.ai_score, engager.risk
                ),
            })
        })
        .collect()
}

impl EngagePanel {
    /// Mark the panel as waiting on the password prompt.
    pub async fn begin_password_prompt(&self) {
        let mut state = self.state.lock().await;
        state.phase = DispatchPhase::PromptingPassword;
        self.publish(&state);
    }

    /// User dismissed the prompt: back to idle, no side effects.
    pub async fn cancel_password_prompt(&self) {
        let mut state = self.state.lock().await;
        state.phase = DispatchPhase::Idle;
        self.publish(&state);
    }

    /// Prompt closed with a password in hand; the consuming operation takes
    /// the machine forward from idle.
    pub async fn close_password_prompt(&self) {
        self.cancel_password_prompt().await;
    }

    /// Dispatch the current selection as one batch.
    ///
    /// Refuses locally (no network call) when any per-op partition does not
    /// fit its bucket, surfacing the per-op shortfalls. Pass a ticket when
    /// the vault cache is cold. On return the selection is cleared and an
    /// immediate reconciliation has been requested.
    pub async fn dispatch_selected(
        &self,
        ticket: Option<UnlockTicket>,
    ) -> Result<DispatchReport, ResonaError> {
        let candidates = {
            let mut state = self.state.lock().await;
            self.refresh_countdown(&mut state);

            let analysis = state.analysis.as_ref().ok_or_else(|| {
                ResonaError::Validation("run an analysis before dispatching".to_string())
            })?;
            if !state.selection.applies_to(analysis.id) {
                return Err(ResonaError::Validation(
                    "select at least one candidate first".to_string(),
                ));
            }
            let candidates = derive_candidates(analysis, &state.selection);
            if candidates.is_empty() {
                return Err(ResonaError::Validation(
                    "none of the selected candidates has an actionable recommendation".to_string(),
                ));
            }

            state.phase = DispatchPhase::Projecting;
            let projection = state
                .limits
                .project(candidates.iter().map(|c| c.action_type));
            if !projection.fits {
                let shortfalls = projection
                    .shortfalls
                    .iter()
                    .map(|(op, n)| format!("{op} over budget by {n}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let err = ResonaError::RateLimited {
                    operation: shortfalls,
                    retry_after_secs: projection.retry_after_secs,
                };
                state.phase = DispatchPhase::Idle;
                state.last_error = Some(err.to_string());
                self.publish(&state);
                return Err(err);
            }

            state.phase = DispatchPhase::Submitting;
            self.publish(&state);
            candidates
        };

        let request = ExecuteRequest {
            selected_actions: candidates,
            user_password: ticket.map(|t| t.into_password().expose_secret().to_string()),
        };
        let response: ExecuteResponse = match self
            .api
            .post_json("/api/automation/execute-actions", &request)
            .await
        {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e).await),
        };

        // Merging: queue entries in server order, deductions and counters only
        // for successes. The lock is held until the phase returns to idle, so
        // no further user action can be accepted before the merge completes.
        let mut state = self.state.lock().await;
        state.phase = DispatchPhase::Merging;
        let now = self.clock.now();
        let mut report = DispatchReport::default();
        let mut likes = 0u32;
        let mut reposts = 0u32;

        for result in response.results {
            let id = state.next_local_action_id();
            state.queue.push(QueuedAction {
                id,
                action_type: result.action_type,
                target: result.target_username.clone(),
                content_preview: result.content_preview.unwrap_or_default(),
                status: if result.success {
                    resona_core::ActionStatus::Completed
                } else {
                    resona_core::ActionStatus::Failed
                },
                scheduled_time: now,
                error: result.error.clone(),
            });

            if result.success {
                report.executed += 1;
                match result.action_type {
                    ActionKind::Like => likes += 1,
                    ActionKind::Repost => reposts += 1,
                }
            } else {
                report.failed += 1;
                report.failures.push((
                    result.target_username,
                    result.error.unwrap_or_else(|| "action failed".to_string()),
                ));
            }
        }

        if likes > 0 {
            state.limits.deduct(OpKind::Like, likes);
            state.counters.likes_today += u64::from(likes);
        }
        if reposts > 0 {
            state.limits.deduct(OpKind::Repost, reposts);
            state.counters.reposts_today += u64::from(reposts);
        }

        state.selection = Selection::empty();
        state.phase = DispatchPhase::Idle;
        state.last_error = None;
        self.publish(&state);
        drop(state);

        if report.failed > 0 {
            warn!(
                executed = report.executed,
                failed = report.failed,
                "dispatch partially failed"
            );
        } else {
            info!(executed = report.executed, "dispatch completed");
        }
        if response.executed_count != report.executed {
            warn!(
                server = response.executed_count,
                local = report.executed,
                "server executed_count disagrees with per-item results"
            );
        }

        // On-demand reconciliation right after dispatch; its own error
        // handling applies.
        self.reconcile_once().await;
        Ok(report)
    }
}

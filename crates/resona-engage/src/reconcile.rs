// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic queue and rate-limit reconciliation.
//!
//! Every tick fetches the action queue and the rate-limit snapshot in
//! parallel and applies both together: the queue is replaced wholesale with
//! server state, the limit merge is guarded by the dispatch sequence so a
//! snapshot fetched before the latest completed dispatch never clobbers
//! optimistic state. Tick failures keep the previous state, are logged once
//! per session, and do not back off -- the next interval simply tries again.

use std::sync::Arc;
use std::time::Duration;

use resona_limits::RateLimitsEnvelope;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::EngagePanel;
use crate::queue::QueueEnvelope;

/// Result of one reconciliation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Both fetches succeeded and server state was applied (the limit merge
    /// may still have been dropped as stale).
    Applied,
    /// No session; nothing was fetched.
    SkippedUnauthenticated,
    /// The server rejected the token; the session was torn down and the
    /// reconciliation loop must stop.
    AuthLost,
    /// A fetch failed; previous state retained.
    Failed,
}

impl EngagePanel {
    /// Run one reconciliation tick.
    pub async fn reconcile_once(&self) -> TickOutcome {
        if !self.api.has_token() {
            return TickOutcome::SkippedUnauthenticated;
        }

        // Read the dispatch sequence before fetching, so a dispatch that
        // completes while the snapshot is in flight marks it stale.
        let observed_seq = {
            let mut state = self.state.lock().await;
            self.refresh_countdown(&mut state);
            state.limits.completed_seq()
        };

        let (queue_result, limits_result) = tokio::join!(
            self.api
                .get_json::<QueueEnvelope>("/api/automation/action-queue"),
            self.api.get_json::<RateLimitsEnvelope>("/api/rate-limits/my"),
        );

        let (queue, limits) = match (queue_result, limits_result) {
            (Ok(queue), Ok(limits)) => (queue, limits),
            (queue_result, limits_result) => {
                let err = match (queue_result, limits_result) {
                    (Err(e), _) => e,
                    (_, Err(e)) => e,
                    _ => unreachable!("at least one side failed"),
                };
                if err.is_auth_loss() {
                    info!("reconciliation received 401; clearing session");
                    self.teardown_session().await;
                    return TickOutcome::AuthLost;
                }
                let mut state = self.state.lock().await;
                if !state.reconcile_error_logged {
                    warn!(error = %err, "reconciliation tick failed; keeping previous state");
                    state.reconcile_error_logged = true;
                }
                return TickOutcome::Failed;
            }
        };

        let mut state = self.state.lock().await;
        state.queue = queue.actions.into_iter().map(Into::into).collect();
        let merged = state.limits.merge(&limits.rate_limits, observed_seq);
        state.reconcile_error_logged = false;
        self.publish(&state);
        debug!(
            queue_len = state.queue.len(),
            limits_merged = merged,
            "reconciliation applied"
        );
        TickOutcome::Applied
    }

    /// Spawn the periodic reconciliation task.
    ///
    /// The task is the panel's only long-lived resource: cancel the token
    /// when the automation surface unmounts. The loop also stops on its own
    /// when a tick loses authentication. Unauthenticated ticks early-exit
    /// without fetching.
    pub fn spawn_reconciler(
        self: &Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let panel = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // Skip the immediate first tick; dispatch triggers on-demand
            // reconciliation itself.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if panel.reconcile_once().await == TickOutcome::AuthLost {
                            info!("reconciler stopped after auth loss");
                            break;
                        }
                    }
                    _ = cancel.cancelled() => {
                        debug!("reconciler cancelled");
                        break;
                    }
                }
            }
        })
    }
}

// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared panel state and the snapshot published to the presentation layer.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use resona_api::UserProfile;
use resona_core::ResonaError;
use resona_limits::RateLimits;
use resona_vault::VaultState;
use serde::Deserialize;

use crate::EngagePanel;
use crate::analysis::Analysis;
use crate::dispatch::DispatchPhase;
use crate::queue::QueuedAction;
use crate::selection::Selection;

/// Aggregate counters shown on the dashboard tiles. Optimistically bumped on
/// analysis/dispatch; server truth replaces them when fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub processed_users: u64,
    pub total_analyzed: u64,
    pub likes_today: u64,
    pub reposts_today: u64,
}

/// The signed-in user record.
#[derive(Debug, Clone)]
pub(crate) struct SessionInfo {
    pub profile: UserProfile,
    pub vault_state: VaultState,
}

/// Mutable panel state. One writer at a time behind the panel mutex; the
/// lock is never held across a network suspension point.
pub(crate) struct PanelState {
    pub limits: RateLimits,
    pub queue: Vec<QueuedAction>,
    pub analysis: Option<Analysis>,
    pub selection: Selection,
    pub counters: Counters,
    pub phase: DispatchPhase,
    pub session: Option<SessionInfo>,
    /// Usernames on the blocked list; engagers on it are filtered from
    /// analysis results.
    pub blocklist: HashSet<String>,
    pub last_error: Option<String>,
    /// When the rate-limit countdowns were last brought current.
    pub last_countdown_at: DateTime<Utc>,
    /// Tick failures are logged once per session, then silenced.
    pub reconcile_error_logged: bool,
    next_analysis_id: u64,
    local_action_counter: u64,
}

impl PanelState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            limits: RateLimits::default(),
            queue: Vec::new(),
            analysis: None,
            selection: Selection::empty(),
            counters: Counters::default(),
            phase: DispatchPhase::Idle,
            session: None,
            blocklist: HashSet::new(),
            last_error: None,
            last_countdown_at: now,
            reconcile_error_logged: false,
            next_analysis_id: 0,
            local_action_counter: 0,
        }
    }

    /// Allocate an identity for a fresh analysis.
    pub fn next_analysis_id(&mut self) -> u64 {
        self.next_analysis_id += 1;
        self.next_analysis_id
    }

    /// Allocate a local id for a queue entry created from a dispatch result.
    /// Reconciliation replaces these with server ids.
    pub fn next_local_action_id(&mut self) -> String {
        self.local_action_counter += 1;
        format!("local-{}", self.local_action_counter)
    }

    pub fn snapshot(&self, authenticated: bool) -> StateSnapshot {
        StateSnapshot {
            authenticated,
            profile: self.session.as_ref().map(|s| s.profile.clone()),
            vault_cached: self
                .session
                .as_ref()
                .map(|s| s.vault_state == VaultState::StoredCached),
            phase: self.phase,
            counters: self.counters,
            limits: self.limits.clone(),
            queue: self.queue.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Immutable view of the panel, published after every mutation.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub authenticated: bool,
    pub profile: Option<UserProfile>,
    /// `Some(true)` when the vault cache is warm, `None` when signed out.
    pub vault_cached: Option<bool>,
    pub phase: DispatchPhase,
    pub counters: Counters,
    pub limits: RateLimits,
    pub queue: Vec<QueuedAction>,
    pub last_error: Option<String>,
}

/// Aggregate counters from `GET /api/dashboard/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardStats {
    pub total_likes: u64,
    pub total_retweets: u64,
    pub today_actions: u64,
    pub queued_actions: u64,
    #[serde(default)]
    pub success_rate: f64,
}

#[derive(Debug, Deserialize)]
struct DashboardEnvelope {
    stats: DashboardStats,
}

impl EngagePanel {
    /// Fetch the server's aggregate dashboard counters.
    pub async fn dashboard(&self) -> Result<DashboardStats, ResonaError> {
        let envelope: DashboardEnvelope = match self.api.get_json("/api/dashboard/stats").await {
            Ok(env) => env,
            Err(e) => return Err(self.fail(e).await),
        };
        Ok(envelope.stats)
    }
}

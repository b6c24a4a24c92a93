// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The automation panel: analysis, selection, batching, and reconciliation.
//!
//! [`EngagePanel`] is the facade a presentation layer drives. It owns the
//! shared mutable state of the panel (rate limits, action queue, the current
//! analysis and selection, counters) behind one async mutex, and publishes a
//! [`StateSnapshot`] through a watch channel after every mutation so a UI can
//! subscribe instead of polling.
//!
//! Concurrency model is cooperative: the lock is never held across a network
//! suspension point, and the only long-lived resource is the reconciliation
//! task spawned by [`EngagePanel::spawn_reconciler`].

pub mod analysis;
pub mod blocklist;
pub mod dispatch;
pub mod queue;
pub mod reconcile;
pub mod selection;
pub mod session;
pub mod state;

pub use analysis::{Analysis, Engager, RecentTweet, RiskTier};
pub use blocklist::BlockedUser;
pub use dispatch::{CandidateAction, DispatchPhase, DispatchReport};
pub use queue::QueuedAction;
pub use reconcile::TickOutcome;
pub use state::{Counters, DashboardStats, StateSnapshot};

use std::sync::Arc;

use resona_api::ApiClient;
use resona_core::Clock;
use resona_vault::VaultClient;
use tokio::sync::{Mutex, watch};

use crate::state::PanelState;

/// The automation panel facade.
pub struct EngagePanel {
    api: Arc<ApiClient>,
    vault: VaultClient,
    clock: Arc<dyn Clock>,
    state: Mutex<PanelState>,
    snapshot_tx: watch::Sender<StateSnapshot>,
}

impl EngagePanel {
    /// Build a panel over an API client and a clock source.
    pub fn new(api: Arc<ApiClient>, clock: Arc<dyn Clock>) -> Self {
        let state = PanelState::new(clock.now());
        let (snapshot_tx, _) = watch::channel(state.snapshot(false));
        Self {
            vault: VaultClient::new(Arc::clone(&api)),
            api,
            clock,
            state: Mutex::new(state),
            snapshot_tx,
        }
    }

    /// The vault client, for credential management surfaces.
    pub fn vault(&self) -> &VaultClient {
        &self.vault
    }

    /// Subscribe to state snapshots. The receiver always holds the latest
    /// published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Current state snapshot, with the rate-limit countdown brought up to
    /// wall-clock time first.
    pub async fn snapshot(&self) -> StateSnapshot {
        let mut state = self.state.lock().await;
        self.refresh_countdown(&mut state);
        state.snapshot(self.api.has_token())
    }

    /// Decrement `next_available_seconds` countdowns by the wall-clock time
    /// elapsed since they were last brought current, so UI countdowns stay
    /// truthful between reconciliations.
    pub(crate) fn refresh_countdown(&self, state: &mut PanelState) {
        let now = self.clock.now();
        let elapsed = (now - state.last_countdown_at).num_seconds().max(0) as u64;
        if elapsed > 0 {
            state.limits.tick(elapsed);
            state.last_countdown_at = now;
        }
    }

    pub(crate) fn publish(&self, state: &PanelState) {
        self.snapshot_tx
            .send_replace(state.snapshot(self.api.has_token()));
    }
}

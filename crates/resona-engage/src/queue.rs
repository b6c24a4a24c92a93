// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The local view of the server's action queue.
//!
//! The server is authoritative: a reconciliation tick replaces the local
//! queue wholesale with the server's list in server order, which both
//! appends entries the client did not know about and drops entries the
//! client held that the server no longer reports. Between ticks, entries
//! created from dispatch results carry synthesized `local-` ids.

use chrono::{DateTime, Utc};
use resona_core::{ActionKind, ActionStatus};
use serde::Deserialize;

/// One queued action as the panel tracks it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedAction {
    pub id: String,
    pub action_type: ActionKind,
    /// Username of the targeted engager.
    pub target: String,
    pub content_preview: String,
    pub status: ActionStatus,
    pub scheduled_time: DateTime<Utc>,
    pub error: Option<String>,
}

/// Wire row of `GET /api/automation/action-queue`.
#[derive(Debug, Deserialize)]
pub(crate) struct QueueEntryWire {
    pub id: String,
    pub action_type: ActionKind,
    pub target_user: String,
    #[serde(default)]
    pub content: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: ActionStatus,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueueEnvelope {
    pub actions: Vec<QueueEntryWire>,
}

impl From<QueueEntryWire> for QueuedAction {
    fn from(wire: QueueEntryWire) -> Self {
        Self {
            id: wire.id,
            action_type: wire.action_type,
            target: wire.target_user,
            content_preview: wire.content,
            status: wire.status,
            scheduled_time: wire.scheduled_time,
            error: wire.error,
        }
    }
}

// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain identifiers and shared enumerations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Platform user identifier (opaque string from the upstream platform).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform post identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TweetId(pub String);

impl std::fmt::Display for TweetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two action kinds the automation pipeline can enqueue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionKind {
    Like,
    Repost,
}

/// Lifecycle of a queued action.
///
/// Transitions are `pending -> running -> (completed | failed)`. Terminal
/// states are sticky until the server drops the record; the client never
/// synthesizes a `running` transition on its own -- only reconciliation does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ActionStatus {
    /// True for `completed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn action_kind_display_and_parse_round_trip() {
        for kind in [ActionKind::Like, ActionKind::Repost] {
            let s = kind.to_string();
            assert_eq!(ActionKind::from_str(&s).unwrap(), kind);
        }
    }

    #[test]
    fn action_status_wire_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&ActionStatus::Pending).unwrap(),
            "\"pending\""
        );
        let parsed: ActionStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, ActionStatus::Failed);
    }

    #[test]
    fn terminal_states() {
        assert!(ActionStatus::Completed.is_terminal());
        assert!(ActionStatus::Failed.is_terminal());
        assert!(!ActionStatus::Pending.is_terminal());
        assert!(!ActionStatus::Running.is_terminal());
    }
}

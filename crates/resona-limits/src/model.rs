// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The three-bucket rate-limit model.
//!
//! Exactly three writers exist for this state: [`RateLimits::deduct`]
//! (optimistic, on successful dispatch), [`RateLimits::merge`] (server
//! snapshot on reconciliation), and [`RateLimits::tick`] (wall-clock
//! countdown). A monotonic dispatch sequence keeps a reconciliation whose
//! snapshot was fetched before the latest completed dispatch from clobbering
//! optimistic state.

use resona_core::ActionKind;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::bucket::LimitBucket;
use crate::snapshot::RateLimitsSnapshot;

/// Default short/long window limits, from the upstream platform's contract.
pub const ENGAGER_FETCH_LIMITS: (u32, u32) = (75, 7_200);
pub const LIKE_LIMITS: (u32, u32) = (1, 1_000);
pub const REPOST_LIMITS: (u32, u32) = (50, 1_000);

/// The three governed operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum OpKind {
    EngagerFetch,
    Like,
    Repost,
}

impl OpKind {
    /// The bucket an action kind draws from.
    pub fn for_action(action: ActionKind) -> Self {
        match action {
            ActionKind::Like => OpKind::Like,
            ActionKind::Repost => OpKind::Repost,
        }
    }
}

/// Result of projecting a planned batch against the current budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// True iff every partition of the batch fits its bucket.
    pub fits: bool,
    /// Per-op shortfall (`needed - headroom`) for partitions that do not fit.
    pub shortfalls: Vec<(OpKind, u32)>,
    /// Largest active cooldown among the buckets the batch touches.
    pub retry_after_secs: u64,
}

/// Budget state across all operation kinds, plus the dispatch sequence used
/// to order optimistic deductions against server snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimits {
    engager_fetch: LimitBucket,
    like: LimitBucket,
    repost: LimitBucket,
    /// Bumped once per completed dispatch (each `deduct` call).
    completed_seq: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            engager_fetch: LimitBucket::full(ENGAGER_FETCH_LIMITS.0, ENGAGER_FETCH_LIMITS.1),
            like: LimitBucket::full(LIKE_LIMITS.0, LIKE_LIMITS.1),
            repost: LimitBucket::full(REPOST_LIMITS.0, REPOST_LIMITS.1),
            completed_seq: 0,
        }
    }
}

impl RateLimits {
    pub fn bucket(&self, op: OpKind) -> &LimitBucket {
        match op {
            OpKind::EngagerFetch => &self.engager_fetch,
            OpKind::Like => &self.like,
            OpKind::Repost => &self.repost,
        }
    }

    fn bucket_mut(&mut self, op: OpKind) -> &mut LimitBucket {
        match op {
            OpKind::EngagerFetch => &mut self.engager_fetch,
            OpKind::Like => &mut self.like,
            OpKind::Repost => &mut self.repost,
        }
    }

    /// True iff `n` operations of kind `op` fit right now.
    pub fn can(&self, op: OpKind, n: u32) -> bool {
        self.bucket(op).can(n)
    }

    /// Group a candidate batch by the bucket it draws from and check every
    /// partition. The whole batch is refused when any partition falls short.
    pub fn project<I>(&self, batch: I) -> Projection
    where
        I: IntoIterator<Item = ActionKind>,
    {
        let mut needed = [(OpKind::Like, 0u32), (OpKind::Repost, 0u32)];
        for action in batch {
            match OpKind::for_action(action) {
                OpKind::Like => needed[0].1 += 1,
                OpKind::Repost => needed[1].1 += 1,
                OpKind::EngagerFetch => unreachable!("actions never draw engager-fetch credits"),
            }
        }

        let mut shortfalls = Vec::new();
        let mut retry_after_secs = 0;
        for (op, n) in needed {
            if n == 0 {
                continue;
            }
            let bucket = self.bucket(op);
            if !bucket.can(n) {
                shortfalls.push((op, n.saturating_sub(bucket.headroom())));
                retry_after_secs = retry_after_secs.max(bucket.next_available_seconds);
            }
        }

        Projection {
            fits: shortfalls.is_empty(),
            shortfalls,
            retry_after_secs,
        }
    }

    /// Optimistic deduction after a successful dispatch. Bumps the completed
    /// dispatch sequence so stale reconciliations can be detected.
    pub fn deduct(&mut self, op: OpKind, n: u32) {
        self.bucket_mut(op).deduct(n);
        self.completed_seq += 1;
        debug!(op = %op, n, seq = self.completed_seq, "optimistic deduction applied");
    }

    /// Sequence number of the latest completed dispatch. Reconcilers read
    /// this *before* fetching a snapshot and pass it back to [`merge`].
    ///
    /// [`merge`]: RateLimits::merge
    pub fn completed_seq(&self) -> u64 {
        self.completed_seq
    }

    /// Replace local buckets with a server snapshot. `observed_seq` is the
    /// value of [`completed_seq`] read before the snapshot was fetched; when
    /// a dispatch completed in between, the snapshot pre-dates it and is
    /// dropped. Returns whether the merge was applied.
    ///
    /// [`completed_seq`]: RateLimits::completed_seq
    pub fn merge(&mut self, snapshot: &RateLimitsSnapshot, observed_seq: u64) -> bool {
        if observed_seq < self.completed_seq {
            debug!(
                observed_seq,
                completed_seq = self.completed_seq,
                "dropping stale rate-limit snapshot"
            );
            return false;
        }
        self.engager_fetch.absorb(&snapshot.get_liking_users);
        self.like.absorb(&snapshot.like);
        self.repost.absorb(&snapshot.retweet);
        true
    }

    /// Count every cooldown down by wall-clock elapsed seconds.
    pub fn tick(&mut self, elapsed_secs: u64) {
        if elapsed_secs == 0 {
            return;
        }
        for op in OpKind::iter() {
            self.bucket_mut(op).tick(elapsed_secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::BucketSnapshot;

    fn snapshot_all_full() -> RateLimitsSnapshot {
        fn full(short: u32, long: u32) -> BucketSnapshot {
            BucketSnapshot {
                short_limit: short,
                short_used: 0,
                short_remaining: short,
                long_limit: long,
                long_used: 0,
                long_remaining: long,
                next_available_seconds: 0,
                can_make_request: true,
            }
        }
        RateLimitsSnapshot {
            like: full(1, 1000),
            retweet: full(50, 1000),
            get_liking_users: full(75, 7200),
        }
    }

    #[test]
    fn defaults_match_platform_limits() {
        let limits = RateLimits::default();
        assert_eq!(limits.bucket(OpKind::EngagerFetch).short_limit, 75);
        assert_eq!(limits.bucket(OpKind::EngagerFetch).long_limit, 7200);
        assert_eq!(limits.bucket(OpKind::Like).short_limit, 1);
        assert_eq!(limits.bucket(OpKind::Repost).short_limit, 50);
    }

    #[test]
    fn project_accepts_exact_budget_and_rejects_one_more() {
        let mut limits = RateLimits::default();
        // Leave exactly 3 reposts of short-window budget.
        limits.deduct(OpKind::Repost, 47);

        let exact = limits.project(std::iter::repeat_n(ActionKind::Repost, 3));
        assert!(exact.fits);
        assert!(exact.shortfalls.is_empty());

        let over = limits.project(std::iter::repeat_n(ActionKind::Repost, 4));
        assert!(!over.fits);
        assert_eq!(over.shortfalls, vec![(OpKind::Repost, 1)]);
    }

    #[test]
    fn project_refuses_whole_batch_when_one_partition_falls_short() {
        let mut limits = RateLimits::default();
        limits.deduct(OpKind::Like, 1); // like short window is now empty

        let projection = limits.project([ActionKind::Like, ActionKind::Repost]);
        assert!(!projection.fits);
        assert_eq!(projection.shortfalls, vec![(OpKind::Like, 1)]);
    }

    #[test]
    fn project_surfaces_cooldown_of_blocked_bucket() {
        let mut limits = RateLimits::default();
        limits.deduct(OpKind::Like, 1);
        limits.merge(
            &{
                let mut snap = snapshot_all_full();
                snap.like.short_remaining = 0;
                snap.like.short_used = 1;
                snap.like.next_available_seconds = 600;
                snap
            },
            limits.completed_seq(),
        );

        let projection = limits.project([ActionKind::Like]);
        assert!(!projection.fits);
        assert_eq!(projection.retry_after_secs, 600);
    }

    #[test]
    fn merge_overrides_optimistic_deduction() {
        let mut limits = RateLimits::default();
        limits.deduct(OpKind::Like, 1);
        assert_eq!(limits.bucket(OpKind::Like).short_remaining, 0);

        // Snapshot fetched after that dispatch completed: applies, server wins.
        let applied = limits.merge(&snapshot_all_full(), limits.completed_seq());
        assert!(applied);
        assert_eq!(limits.bucket(OpKind::Like).short_remaining, 1);
    }

    #[test]
    fn merge_drops_snapshot_fetched_before_latest_dispatch() {
        let mut limits = RateLimits::default();
        let observed = limits.completed_seq();

        // A dispatch completes while the snapshot is in flight.
        limits.deduct(OpKind::Repost, 2);
        let remaining_after_dispatch = limits.bucket(OpKind::Repost).short_remaining;

        let applied = limits.merge(&snapshot_all_full(), observed);
        assert!(!applied);
        assert_eq!(
            limits.bucket(OpKind::Repost).short_remaining,
            remaining_after_dispatch
        );
    }

    #[test]
    fn deduct_bumps_completed_seq() {
        let mut limits = RateLimits::default();
        assert_eq!(limits.completed_seq(), 0);
        limits.deduct(OpKind::Like, 1);
        limits.deduct(OpKind::Repost, 1);
        assert_eq!(limits.completed_seq(), 2);
    }

    #[test]
    fn tick_counts_down_every_bucket() {
        let mut limits = RateLimits::default();
        limits.merge(
            &{
                let mut snap = snapshot_all_full();
                snap.like.next_available_seconds = 90;
                snap.get_liking_users.next_available_seconds = 30;
                snap
            },
            0,
        );

        limits.tick(45);
        assert_eq!(limits.bucket(OpKind::Like).next_available_seconds, 45);
        assert_eq!(limits.bucket(OpKind::EngagerFetch).next_available_seconds, 0);
    }

    #[test]
    fn op_kind_display_names_are_snake_case() {
        assert_eq!(OpKind::EngagerFetch.to_string(), "engager_fetch");
        assert_eq!(OpKind::Like.to_string(), "like");
        assert_eq!(OpKind::Repost.to_string(), "repost");
    }
}

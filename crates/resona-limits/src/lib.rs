// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side rate-limit governor.
//!
//! Three independent budgets (engager-fetch, like, repost), each with a
//! 15-minute and a 24-hour window. The model projects whether a planned
//! batch fits, applies optimistic deductions on dispatch, and absorbs
//! server snapshots on reconciliation -- server truth always wins, except
//! that snapshots fetched before the latest completed dispatch are dropped.

pub mod bucket;
pub mod model;
pub mod snapshot;

pub use bucket::LimitBucket;
pub use model::{OpKind, Projection, RateLimits};
pub use snapshot::{BucketSnapshot, RateLimitsEnvelope, RateLimitsSnapshot};

// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Resona engagement-automation client.
//!
//! This crate provides the error type, domain identifiers, and common
//! enumerations shared by every crate in the workspace. It holds no I/O:
//! transport, vault, and automation logic live in the crates that depend
//! on this one.

pub mod clock;
pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ResonaError;
pub use types::{ActionKind, ActionStatus, TweetId, UserId};

// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the server-side operator-blind credential vault.

pub mod client;
pub mod keys;
pub mod ticket;

pub use client::{KeyStatus, TestOutcome, VaultClient, VaultState};
pub use keys::PlatformKeys;
pub use ticket::{MIN_PASSWORD_LEN, UnlockTicket};

// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport and authentication endpoints for the Resona backend API.
//!
//! Higher-level surfaces (vault client, automation panel) build their typed
//! calls on [`ApiClient`]'s JSON verbs; only the sign-in/sign-out endpoints
//! live here because the session token is this crate's one piece of state.

pub mod auth;
pub mod client;

pub use auth::{Ack, LoginRequest, LoginResponse, UserProfile};
pub use client::ApiClient;

// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Resona client.

use thiserror::Error;

/// The primary error type used across all Resona crates.
///
/// Transport and server failures are normalized here so callers can match on
/// the failure kind instead of inspecting status codes or body text.
#[derive(Debug, Error)]
pub enum ResonaError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Network unreachable, request build failure, or a non-JSON body where
    /// JSON was expected.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-2xx server response carrying the server's `detail` field when the
    /// body parsed, otherwise the status line.
    #[error("server error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// No bearer token, or the server rejected the one we sent.
    #[error("authentication required")]
    AuthRequired,

    /// The server-side credential cache is cold and the call needs the user's
    /// password to unlock the vault.
    #[error("vault password required")]
    VaultPasswordRequired,

    /// A rate-limit bucket cannot cover the requested operation.
    #[error("rate limited: {operation} available again in {retry_after_secs}s")]
    RateLimited {
        operation: String,
        retry_after_secs: u64,
    },

    /// Local input validation failure. No network call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ResonaError {
    /// True when the session must be torn down and the user routed to sign-in.
    pub fn is_auth_loss(&self) -> bool {
        matches!(self, ResonaError::AuthRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_displays_status_and_detail() {
        let err = ResonaError::Api {
            status: 422,
            detail: "tweet_url is malformed".into(),
        };
        assert_eq!(err.to_string(), "server error (422): tweet_url is malformed");
    }

    #[test]
    fn rate_limited_displays_wait_time() {
        let err = ResonaError::RateLimited {
            operation: "like".into(),
            retry_after_secs: 600,
        };
        assert!(err.to_string().contains("600s"));
    }

    #[test]
    fn only_auth_required_is_auth_loss() {
        assert!(ResonaError::AuthRequired.is_auth_loss());
        assert!(!ResonaError::VaultPasswordRequired.is_auth_loss());
        assert!(!ResonaError::Validation("x".into()).is_auth_loss());
    }
}

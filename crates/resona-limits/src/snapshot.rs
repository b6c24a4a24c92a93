// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire shape of `GET /api/rate-limits/my`.
//!
//! The server keys the map by its endpoint names (`like`, `retweet`,
//! `get_liking_users`); the model maps those to [`crate::OpKind`].

use serde::Deserialize;

/// One bucket as reported by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct BucketSnapshot {
    pub short_limit: u32,
    pub short_used: u32,
    pub short_remaining: u32,
    pub long_limit: u32,
    pub long_used: u32,
    pub long_remaining: u32,
    pub next_available_seconds: u64,
    /// Derived server-side; the local model recomputes it and only reads the
    /// raw counters.
    #[serde(default)]
    pub can_make_request: bool,
}

/// The three buckets, under the server's wire names.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitsSnapshot {
    pub like: BucketSnapshot,
    pub retweet: BucketSnapshot,
    pub get_liking_users: BucketSnapshot,
}

/// Envelope of `GET /api/rate-limits/my`.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitsEnvelope {
    pub rate_limits: RateLimitsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_server_payload() {
        let body = serde_json::json!({
            "rate_limits": {
                "like": {
                    "short_limit": 1, "short_used": 0, "short_remaining": 1,
                    "long_limit": 1000, "long_used": 4, "long_remaining": 996,
                    "next_available_seconds": 0, "can_make_request": true
                },
                "retweet": {
                    "short_limit": 50, "short_used": 2, "short_remaining": 48,
                    "long_limit": 1000, "long_used": 2, "long_remaining": 998,
                    "next_available_seconds": 0, "can_make_request": true
                },
                "get_liking_users": {
                    "short_limit": 75, "short_used": 75, "short_remaining": 0,
                    "long_limit": 7200, "long_used": 75, "long_remaining": 7125,
                    "next_available_seconds": 540
                }
            }
        });

        let envelope: RateLimitsEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.rate_limits.like.short_limit, 1);
        assert_eq!(envelope.rate_limits.retweet.short_remaining, 48);
        assert_eq!(envelope.rate_limits.get_liking_users.next_available_seconds, 540);
        // can_make_request defaults to false when the server omits it.
        assert!(!envelope.rate_limits.get_liking_users.can_make_request);
    }
}

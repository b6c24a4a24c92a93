// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The four platform credentials handed to the vault.

use secrecy::SecretString;

/// The OAuth 1.0a credential set for the upstream platform.
///
/// Held only long enough to ship to the server vault; every field zeroizes
/// on drop and `Debug` output is redacted.
pub struct PlatformKeys {
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub access_token: SecretString,
    pub access_token_secret: SecretString,
}

impl std::fmt::Debug for PlatformKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformKeys")
            .field("api_key", &"[redacted]")
            .field("api_secret", &"[redacted]")
            .field("access_token", &"[redacted]")
            .field("access_token_secret", &"[redacted]")
            .finish()
    }
}

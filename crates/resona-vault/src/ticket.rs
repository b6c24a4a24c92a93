// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The move-only vault unlock ticket.
//!
//! A ticket wraps the user's password for exactly one vault-dependent
//! request. It is consumed (moved) by the call it authorizes, so the type
//! system forbids long-lived storage in fields; it is never persisted and
//! its `Debug` output is redacted.

use resona_core::ResonaError;
use secrecy::{ExposeSecret, SecretString};

/// Minimum accepted password length. Checked locally so an obviously bad
/// password never reaches the network.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Capability to unlock the server-side vault for one request.
pub struct UnlockTicket {
    password: SecretString,
}

impl std::fmt::Debug for UnlockTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockTicket")
            .field("password", &"[redacted]")
            .finish()
    }
}

impl UnlockTicket {
    /// Wrap a password, validating its length.
    pub fn new(password: SecretString) -> Result<Self, ResonaError> {
        if password.expose_secret().len() < MIN_PASSWORD_LEN {
            return Err(ResonaError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(Self { password })
    }

    /// Consume the ticket, yielding the password for the one request body it
    /// authorizes. The caller must not retain the returned secret beyond
    /// serializing that request.
    pub fn into_password(self) -> SecretString {
        self.password
    }
}

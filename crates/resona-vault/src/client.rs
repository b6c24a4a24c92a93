// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed calls against the server-side credential vault.
//!
//! The vault is operator-blind: credentials are encrypted server-side with a
//! key derived from the user's password, and this client never attempts
//! local decryption. A password only ever appears inline in a single request
//! body, delivered through a consumed [`UnlockTicket`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use resona_api::{Ack, ApiClient};
use resona_core::ResonaError;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::keys::PlatformKeys;
use crate::ticket::UnlockTicket;

/// Stored-credential status as reported by `GET /api/auth/api-keys`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyStatus {
    pub configured: bool,
    pub valid: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_count: u64,
}

/// Result of asking the server to decrypt and validate against the upstream
/// platform.
#[derive(Debug, Clone, Deserialize)]
pub struct TestOutcome {
    pub is_valid: bool,
    #[serde(default)]
    pub upstream_handle: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Where the vault stands for the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No credentials stored.
    Unset,
    /// Credentials stored, but the server holds no decrypted copy for this
    /// session; the next vault-dependent operation needs a password.
    StoredUncached,
    /// Credentials stored and the server cache is warm; operations may omit
    /// the password.
    StoredCached,
}

#[derive(Debug, Deserialize)]
struct CachedCheck {
    has_cached_keys: bool,
}

// Private: carries plaintext only between construction and serialization,
// and wipes it when the request value drops.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct SaveKeysRequest {
    api_key: String,
    api_secret: String,
    access_token: String,
    access_token_secret: String,
    user_password: String,
}

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
struct TestKeysRequest {
    user_password: String,
}

/// Client for the credential-vault endpoints.
#[derive(Debug, Clone)]
pub struct VaultClient {
    api: Arc<ApiClient>,
}

impl VaultClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Stored-credential status, or `None` when nothing is stored (404).
    pub async fn status(&self) -> Result<Option<KeyStatus>, ResonaError> {
        match self.api.get_json("/api/auth/api-keys").await {
            Ok(status) => Ok(Some(status)),
            Err(ResonaError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether the server holds a decrypted credential for this session.
    /// Decides whether the next operation will need a password prompt.
    pub async fn cached_check(&self) -> Result<bool, ResonaError> {
        let check: CachedCheck = self.api.get_json("/api/auth/api-keys/cached").await?;
        Ok(check.has_cached_keys)
    }

    /// Combined vault state for the session record.
    pub async fn state(&self) -> Result<VaultState, ResonaError> {
        match self.status().await? {
            None => Ok(VaultState::Unset),
            Some(_) => {
                if self.cached_check().await? {
                    Ok(VaultState::StoredCached)
                } else {
                    Ok(VaultState::StoredUncached)
                }
            }
        }
    }

    /// Ship the four platform credentials plus the user's password to the
    /// server vault. Succeeds or fails atomically; on success the client
    /// holds no plaintext.
    pub async fn save(&self, keys: &PlatformKeys, ticket: UnlockTicket) -> Result<(), ResonaError> {
        let password = ticket.into_password();
        let request = SaveKeysRequest {
            api_key: keys.api_key.expose_secret().to_string(),
            api_secret: keys.api_secret.expose_secret().to_string(),
            access_token: keys.access_token.expose_secret().to_string(),
            access_token_secret: keys.access_token_secret.expose_secret().to_string(),
            user_password: password.expose_secret().to_string(),
        };
        let _: Ack = self.api.post_json("/api/auth/api-keys", &request).await?;
        info!("platform credentials stored in vault");
        Ok(())
    }

    /// Ask the server to decrypt with the supplied password and validate
    /// against the upstream platform.
    pub async fn test(&self, ticket: UnlockTicket) -> Result<TestOutcome, ResonaError> {
        let password = ticket.into_password();
        let request = TestKeysRequest {
            user_password: password.expose_secret().to_string(),
        };
        let outcome: TestOutcome = self
            .api
            .post_json("/api/auth/api-keys/test", &request)
            .await?;
        debug!(is_valid = outcome.is_valid, "vault test completed");
        Ok(outcome)
    }

    /// Remove the stored credentials.
    pub async fn delete(&self) -> Result<(), ResonaError> {
        let _: Ack = self.api.delete_json("/api/auth/api-keys").await?;
        info!("platform credentials deleted from vault");
        Ok(())
    }
}

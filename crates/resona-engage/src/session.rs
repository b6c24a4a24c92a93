// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle: sign-in, sign-out, and auth-loss teardown.
//!
//! The bearer token is the only client-side secret. It lives in the API
//! client's token cell, read by every component and written only here.

use resona_api::{LoginRequest, UserProfile};
use resona_core::ResonaError;
use resona_vault::VaultState;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::EngagePanel;
use crate::state::SessionInfo;

impl EngagePanel {
    /// Sign in. On success the bearer token is stored and the vault state is
    /// probed so the UI knows whether the next operation will prompt for a
    /// password.
    pub async fn sign_in(
        &self,
        email: &str,
        password: SecretString,
    ) -> Result<UserProfile, ResonaError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ResonaError::Validation(
                "enter a valid email address".to_string(),
            ));
        }
        if password.expose_secret().is_empty() {
            return Err(ResonaError::Validation("enter a password".to_string()));
        }

        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.expose_secret().to_string(),
            })
            .await?;
        self.api.set_token(response.access_token);

        // Cache-warm probe; failures here must not fail the sign-in.
        let vault_state = match self.vault.state().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "vault state probe failed after sign-in");
                VaultState::Unset
            }
        };

        let profile = response.user;
        let mut state = self.state.lock().await;
        state.session = Some(SessionInfo {
            profile: profile.clone(),
            vault_state,
        });
        state.reconcile_error_logged = false;
        state.last_error = None;
        self.publish(&state);
        info!(username = %profile.username, "signed in");
        Ok(profile)
    }

    /// Restore a persisted session (token + profile) without a login round
    /// trip, then probe the vault state the same way sign-in does.
    pub async fn restore_session(&self, token: String, profile: UserProfile) {
        self.api.set_token(token);
        let vault_state = match self.vault.state().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "vault state probe failed on session restore");
                VaultState::Unset
            }
        };
        let mut state = self.state.lock().await;
        state.session = Some(SessionInfo {
            profile,
            vault_state,
        });
        self.publish(&state);
    }

    /// Sign out: best-effort server logout, then local teardown.
    pub async fn sign_out(&self) {
        if self.api.has_token()
            && let Err(e) = self.api.logout().await
        {
            warn!(error = %e, "server logout failed; clearing session anyway");
        }
        self.teardown_session().await;
    }

    /// True while a bearer token is held.
    pub fn authenticated(&self) -> bool {
        self.api.has_token()
    }

    /// Whether the next vault-dependent operation needs a password prompt.
    pub async fn needs_password(&self) -> Result<bool, ResonaError> {
        let cached = match self.vault.cached_check().await {
            Ok(cached) => cached,
            Err(e) => return Err(self.fail(e).await),
        };
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.as_mut()
            && session.vault_state != VaultState::Unset
        {
            session.vault_state = if cached {
                VaultState::StoredCached
            } else {
                VaultState::StoredUncached
            };
        }
        Ok(!cached)
    }

    /// Drop the token and all sensitive or session-scoped state.
    pub(crate) async fn teardown_session(&self) {
        self.api.clear_token();
        let mut state = self.state.lock().await;
        state.session = None;
        state.analysis = None;
        state.selection = crate::selection::Selection::empty();
        state.queue.clear();
        state.limits = resona_limits::RateLimits::default();
        state.counters = crate::state::Counters::default();
        state.phase = crate::dispatch::DispatchPhase::Idle;
        state.last_error = None;
        self.publish(&state);
        info!("session cleared");
    }

    /// Record a failure: auth loss tears the session down; anything else is
    /// surfaced as the component-local error string, leaving global state
    /// unchanged. Returns the error for propagation.
    pub(crate) async fn fail(&self, err: ResonaError) -> ResonaError {
        if err.is_auth_loss() {
            self.teardown_session().await;
            return err;
        }
        {
            let mut state = self.state.lock().await;
            state.phase = crate::dispatch::DispatchPhase::Idle;
            state.last_error = Some(err.to_string());
            self.publish(&state);
        }
        // A server-side rate-limit rejection means the local budgets have
        // drifted; reconcile immediately so the panel reflects truth.
        if matches!(err, ResonaError::RateLimited { .. }) {
            self.reconcile_once().await;
        }
        err
    }
}

// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk session record.
//!
//! Persists the bearer token and user profile between CLI invocations --
//! the native analog of the browser keeping its token across page loads.
//! Platform credentials are never written here; those live only in the
//! server-side vault.

use std::fs;
use std::io;
use std::path::PathBuf;

use resona_api::UserProfile;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The persisted session record.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub user: UserProfile,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("access_token", &"[redacted]")
            .field("user", &self.user)
            .finish()
    }
}

fn session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("resona/session.json"))
}

/// Load the stored session, if any. Unreadable or corrupt files are treated
/// as signed-out.
pub fn load() -> Option<StoredSession> {
    let path = session_path()?;
    let bytes = fs::read(&path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!(error = %e, "ignoring corrupt session file");
            None
        }
    }
}

/// Persist the session record with owner-only permissions.
pub fn save(session: &StoredSession) -> io::Result<()> {
    let path = session_path()
        .ok_or_else(|| io::Error::other("no config directory available on this platform"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_vec_pretty(session)?;
    fs::write(&path, body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Remove the stored session. Missing files are fine.
pub fn clear() -> io::Result<()> {
    let Some(path) = session_path() else {
        return Ok(());
    };
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

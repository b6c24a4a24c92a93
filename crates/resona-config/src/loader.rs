// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./resona.toml` > `~/.config/resona/resona.toml`
//! > `/etc/resona/resona.toml` with environment variable overrides via the
//! `RESONA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ResonaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/resona/resona.toml` (system-wide)
/// 3. `~/.config/resona/resona.toml` (user XDG config)
/// 4. `./resona.toml` (local directory)
/// 5. `RESONA_*` environment variables
pub fn load_config() -> Result<ResonaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ResonaConfig::default()))
        .merge(Toml::file("/etc/resona/resona.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("resona/resona.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("resona.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ResonaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ResonaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ResonaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ResonaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `RESONA_API_BASE_URL` must map to
/// `api.base_url`, not `api.base.url`.
fn env_provider() -> Env {
    Env::prefixed("RESONA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("api_", "api.", 1)
            .replacen("reconcile_", "reconcile.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_extract_cleanly() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.reconcile.interval_secs, 60);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [api]
            base_url = "https://app.example.com"

            [reconcile]
            interval_secs = 15
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://app.example.com");
        assert_eq!(config.reconcile.interval_secs, 15);
        // Untouched sections keep defaults.
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [api]
            base_uri = "typo"
            "#,
        );
        assert!(result.is_err());
    }
}

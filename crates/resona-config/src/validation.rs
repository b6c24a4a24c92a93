// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects every failure instead of failing fast.

use crate::model::ResonaConfig;

const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err` with all collected
/// validation messages.
pub fn validate_config(config: &ResonaConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let base_url = config.api.base_url.trim();
    if base_url.is_empty() {
        errors.push("api.base_url must not be empty".to_string());
    } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(format!(
            "api.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.api.timeout_secs == 0 {
        errors.push("api.timeout_secs must be greater than zero".to_string());
    }

    if config.reconcile.interval_secs == 0 {
        errors.push("reconcile.interval_secs must be greater than zero".to_string());
    }

    if !KNOWN_LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(format!(
            "log.level `{}` is not one of {}",
            config.log.level,
            KNOWN_LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

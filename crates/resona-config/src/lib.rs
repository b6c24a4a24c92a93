// SPDX-FileCopyrightText: 2026 Resona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loading and validation for the Resona client.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ResonaConfig;

use resona_core::ResonaError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Figment extraction failures and semantic validation failures are both
/// reported as [`ResonaError::Config`] with every collected message.
pub fn load_and_validate() -> Result<ResonaConfig, ResonaError> {
    let config = load_config().map_err(|e| ResonaError::Config(e.to_string()))?;
    validation::validate_config(&config).map_err(|errors| ResonaError::Config(errors.join("; ")))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ResonaConfig::default();
        assert!(validation::validate_config(&config).is_ok());
    }
}

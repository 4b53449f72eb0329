//! TOML guideline loading for the audit parameter catalog.
//!
//! Provides two loading methods:
//! - `default_guidelines()` - Loads the standard catalog compiled into the binary
//! - `load_guidelines(path)` - Loads a custom catalog from a file path

use anyhow::{bail, Result};
use std::path::Path;

use super::types::GuidelinesConfig;

/// Standard guideline catalog embedded in the binary at compile time.
/// These are loaded from `config/parameter_guidelines.toml`.
const DEFAULT_GUIDELINES: &str = include_str!("../../config/parameter_guidelines.toml");

/// Load a guideline catalog from a TOML file at the given path.
///
/// Service companies adjust thresholds per region or equipment brand;
/// a custom file replaces the whole catalog, it is not merged with the
/// embedded one.
///
/// # Arguments
/// * `path` - Path to the TOML file containing parameter definitions
///
/// # Returns
/// * `Ok(GuidelinesConfig)` - Parsed catalog
/// * `Err` - If the file cannot be read, the TOML is invalid, or a
///   definition has an inverted range
pub fn load_guidelines(path: &Path) -> Result<GuidelinesConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: GuidelinesConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Get the standard guideline catalog embedded in the binary.
///
/// Covers 12 parameters across the 5 audit categories:
/// - Vacuum: claw vacuum, milk line vacuum, vacuum reserve
/// - Pulsation: rate, ratio, pulsation vacuum
/// - Flow: peak and average flow rate
/// - Detacher: detach flow rate, detach delay
/// - General: system air leak, liner slip rate
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_guidelines() -> GuidelinesConfig {
    toml::from_str(DEFAULT_GUIDELINES)
        .expect("embedded parameter_guidelines.toml must be valid TOML")
}

/// Reject catalogs that would make evaluation meaningless.
fn validate(config: &GuidelinesConfig) -> Result<()> {
    for def in &config.parameters {
        if def.name.trim().is_empty() {
            bail!("guideline entry with empty name");
        }
        if def.min_value > def.max_value {
            bail!(
                "guideline '{}' has inverted range: min {} > max {}",
                def.name,
                def.min_value,
                def.max_value
            );
        }
    }
    Ok(())
}

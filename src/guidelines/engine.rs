//! Guideline evaluation for audit readings.
//!
//! The `GuidelineCatalog` wraps a loaded guideline configuration and
//! classifies readings against their acceptable ranges, producing a
//! status and remediation recommendations for each value.

use std::path::Path;

use super::types::{GuidelinesConfig, ParameterCategory, ParameterDefinition, ParameterStatus};
use crate::error::AuditError;

/// How far outside the range (as a fraction of the range width) a reading
/// may fall before it is classified Critical instead of Low/High.
const CRITICAL_BAND_FRACTION: f64 = 0.2;

/// The guideline catalog and evaluation engine.
///
/// Holds the parameter definitions and classifies readings against them.
/// All methods take `&self` and are deterministic, so a single catalog
/// can be shared across threads.
#[derive(Debug, Clone)]
pub struct GuidelineCatalog {
    config: GuidelinesConfig,
}

impl GuidelineCatalog {
    /// Create a catalog from the given configuration
    /// (typically from `default_guidelines()` or `load_guidelines()`).
    pub fn new(config: GuidelinesConfig) -> Self {
        Self { config }
    }

    /// Create the standard catalog embedded in the binary.
    pub fn standard() -> Self {
        Self::new(super::catalog::default_guidelines())
    }

    /// Load a custom catalog from a TOML file, replacing the standard
    /// one entirely.
    pub fn from_file(path: &Path) -> Result<Self, AuditError> {
        let config = super::catalog::load_guidelines(path)
            .map_err(|e| AuditError::Guidelines(e.to_string()))?;
        Ok(Self::new(config))
    }

    /// Look up a parameter definition by exact, case-sensitive name.
    pub fn get(&self, name: &str) -> Option<&ParameterDefinition> {
        self.config.parameters.iter().find(|p| p.name == name)
    }

    /// All definitions in the given category, in catalog order.
    pub fn by_category(&self, category: ParameterCategory) -> Vec<&ParameterDefinition> {
        self.config
            .parameters
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// List all known parameter names, in catalog order.
    pub fn known_parameters(&self) -> Vec<&str> {
        self.config.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Classify a reading against its guideline range.
    ///
    /// Bounds are inclusive: a reading exactly at min or max is Normal.
    /// Readings beyond the range by more than 20% of the range width are
    /// Critical; anything else outside the range is Low or High.
    ///
    /// Unknown parameter names evaluate to Normal. Callers that need to
    /// distinguish "in range" from "not classifiable" should check
    /// `get(name)` first.
    pub fn evaluate(&self, name: &str, value: f64) -> ParameterStatus {
        let Some(def) = self.get(name) else {
            return ParameterStatus::Normal;
        };

        let span = def.max_value - def.min_value;
        if value < def.min_value {
            if value < def.min_value - span * CRITICAL_BAND_FRACTION {
                ParameterStatus::Critical
            } else {
                ParameterStatus::Low
            }
        } else if value > def.max_value {
            if value > def.max_value + span * CRITICAL_BAND_FRACTION {
                ParameterStatus::Critical
            } else {
                ParameterStatus::High
            }
        } else {
            ParameterStatus::Normal
        }
    }

    /// Remediation recommendations for a reading.
    ///
    /// Returns the definition's remediation steps followed by exactly one
    /// status-specific line. Unknown parameters return an empty list.
    pub fn recommendations(&self, name: &str, value: f64) -> Vec<String> {
        let Some(def) = self.get(name) else {
            return Vec::new();
        };

        let status = self.evaluate(name, value);
        let mut recommendations = def.recommendations.clone();
        recommendations.push(status_note(status).to_string());
        recommendations
    }
}

impl Default for GuidelineCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn status_note(status: ParameterStatus) -> &'static str {
    match status {
        ParameterStatus::Low => "Value is below recommended range - investigate cause",
        ParameterStatus::High => "Value is above recommended range - investigate cause",
        ParameterStatus::Critical => {
            "CRITICAL: Value is significantly outside safe range - immediate action required"
        }
        ParameterStatus::Normal => "Value is within normal range",
    }
}

//! Type definitions for the parameter guideline catalog.
//!
//! These types support both TOML deserialization (for loading guideline
//! documents) and JSON serialization (for handing results to a UI layer).

use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION TYPES (loaded from TOML)
// =============================================================================

/// Root configuration loaded from parameter_guidelines.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct GuidelinesConfig {
    /// Ordered list of parameter definitions
    pub parameters: Vec<ParameterDefinition>,
}

/// Guideline definition for one measurable milking-system parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Parameter name, unique within the catalog (e.g., "Claw Vacuum").
    /// Lookups are exact and case-sensitive.
    pub name: String,
    /// Equipment subsystem this parameter belongs to
    pub category: ParameterCategory,
    /// Unit for display (e.g., "in Hg", "cycles/min")
    pub unit: String,
    /// Lower bound of the acceptable range (inclusive)
    pub min_value: f64,
    /// Upper bound of the acceptable range (inclusive)
    pub max_value: f64,
    /// Ideal value technicians aim for, if one is defined
    #[serde(default)]
    pub target_value: Option<f64>,
    /// Short explanation of what the parameter measures
    pub description: String,
    /// Remediation steps to suggest when a reading is off
    pub recommendations: Vec<String>,
}

/// Equipment subsystem categories for audit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterCategory {
    Vacuum,
    Pulsation,
    Flow,
    Detacher,
    General,
}

impl ParameterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterCategory::Vacuum => "vacuum",
            ParameterCategory::Pulsation => "pulsation",
            ParameterCategory::Flow => "flow",
            ParameterCategory::Detacher => "detacher",
            ParameterCategory::General => "general",
        }
    }

    /// Parse a stored category string. Unknown strings map to `General`
    /// so older databases stay readable.
    pub fn from_str(input: &str) -> ParameterCategory {
        match input {
            "vacuum" => ParameterCategory::Vacuum,
            "pulsation" => ParameterCategory::Pulsation,
            "flow" => ParameterCategory::Flow,
            "detacher" => ParameterCategory::Detacher,
            _ => ParameterCategory::General,
        }
    }
}

// =============================================================================
// EVALUATION OUTPUT
// =============================================================================

/// Classification of a reading against its guideline range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStatus {
    Low,
    Normal,
    High,
    Critical,
}

impl ParameterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterStatus::Low => "low",
            ParameterStatus::Normal => "normal",
            ParameterStatus::High => "high",
            ParameterStatus::Critical => "critical",
        }
    }

    pub fn from_str(input: &str) -> ParameterStatus {
        match input {
            "low" => ParameterStatus::Low,
            "high" => ParameterStatus::High,
            "critical" => ParameterStatus::Critical,
            _ => ParameterStatus::Normal,
        }
    }

    /// True for Low, High and Critical readings.
    pub fn needs_attention(&self) -> bool {
        !matches!(self, ParameterStatus::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_deserialize() {
        let toml_str = r#"
            name = "Claw Vacuum"
            category = "vacuum"
            unit = "in Hg"
            min_value = 12.5
            max_value = 15.0
            target_value = 13.5
            description = "Vacuum level at the claw during milking"
            recommendations = ["Check vacuum regulator settings"]
        "#;
        let def: ParameterDefinition = toml::from_str(toml_str).unwrap();
        assert_eq!(def.category, ParameterCategory::Vacuum);
        assert_eq!(def.min_value, 12.5);
        assert_eq!(def.target_value, Some(13.5));
    }

    #[test]
    fn test_missing_target_value_defaults_to_none() {
        let toml_str = r#"
            name = "Liner Slip Rate"
            category = "general"
            unit = "%"
            min_value = 0
            max_value = 5
            description = "Percentage of liners that slip during milking"
            recommendations = []
        "#;
        let def: ParameterDefinition = toml::from_str(toml_str).unwrap();
        assert!(def.target_value.is_none());
    }

    #[test]
    fn test_category_round_trip() {
        for cat in [
            ParameterCategory::Vacuum,
            ParameterCategory::Pulsation,
            ParameterCategory::Flow,
            ParameterCategory::Detacher,
            ParameterCategory::General,
        ] {
            assert_eq!(ParameterCategory::from_str(cat.as_str()), cat);
        }
    }

    #[test]
    fn test_status_serialize_lowercase() {
        let json = serde_json::to_string(&ParameterStatus::Critical).unwrap();
        assert_eq!(json, r#""critical""#);
    }

    #[test]
    fn test_needs_attention() {
        assert!(!ParameterStatus::Normal.needs_attention());
        assert!(ParameterStatus::Low.needs_attention());
        assert!(ParameterStatus::High.needs_attention());
        assert!(ParameterStatus::Critical.needs_attention());
    }
}

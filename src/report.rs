//! Report summary model for completed audits.
//!
//! `AuditReport` assembles everything a rendering layer needs into one
//! plain value: header fields, status counts, the issues that need
//! attention and a combined action list. Building a report touches no
//! storage and mutates nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::guidelines::{GuidelineCatalog, ParameterCategory, ParameterStatus};
use crate::session::AuditStatus;
use crate::store::{AuditEntry, AuditSummary};

/// One out-of-range reading with its remediation guidance.
#[derive(Debug, Clone, Serialize)]
pub struct AuditIssue {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub category: ParameterCategory,
    pub status: ParameterStatus,
    /// Acceptable range, when the catalog still defines the parameter.
    pub acceptable_min: Option<f64>,
    pub acceptable_max: Option<f64>,
    pub recommendations: Vec<String>,
}

/// Assembled report data for one audit.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub audit_id: Uuid,
    pub farm_name: Option<String>,
    pub technician: Option<String>,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub normal_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
    /// Non-normal readings, critical ones first, entry order otherwise.
    pub issues: Vec<AuditIssue>,
    /// Every issue recommendation once, alphabetical.
    pub recommended_actions: Vec<String>,
}

impl AuditReport {
    /// Assemble the report for one audit from its summary row and
    /// materialized entries.
    pub fn build(
        summary: &AuditSummary,
        entries: &[AuditEntry],
        catalog: &GuidelineCatalog,
    ) -> AuditReport {
        let mut normal_count = 0;
        let mut warning_count = 0;
        let mut critical_count = 0;
        for entry in entries {
            match entry.status {
                ParameterStatus::Normal => normal_count += 1,
                ParameterStatus::Low | ParameterStatus::High => warning_count += 1,
                ParameterStatus::Critical => critical_count += 1,
            }
        }

        let mut issues: Vec<AuditIssue> = entries
            .iter()
            .filter(|entry| entry.status.needs_attention())
            .map(|entry| {
                let def = catalog.get(&entry.parameter);
                AuditIssue {
                    parameter: entry.parameter.clone(),
                    value: entry.value,
                    unit: entry.unit.clone(),
                    category: entry.category,
                    status: entry.status,
                    acceptable_min: def.map(|d| d.min_value),
                    acceptable_max: def.map(|d| d.max_value),
                    recommendations: catalog.recommendations(&entry.parameter, entry.value),
                }
            })
            .collect();

        // Stable sort keeps entry order within each severity tier
        issues.sort_by_key(|issue| match issue.status {
            ParameterStatus::Critical => 0,
            _ => 1,
        });

        let mut recommended_actions: Vec<String> = issues
            .iter()
            .flat_map(|issue| issue.recommendations.iter().cloned())
            .collect();
        recommended_actions.sort();
        recommended_actions.dedup();

        AuditReport {
            audit_id: summary.id,
            farm_name: summary.farm_name.clone(),
            technician: summary.technician.clone(),
            status: summary.status,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            normal_count,
            warning_count,
            critical_count,
            issues,
            recommended_actions,
        }
    }

    pub fn total_readings(&self) -> usize {
        self.normal_count + self.warning_count + self.critical_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guidelines::{GuidelinesConfig, ParameterDefinition};

    fn summary() -> AuditSummary {
        AuditSummary {
            id: Uuid::new_v4(),
            farm_id: Some("farm-1".to_string()),
            farm_name: Some("Meadowbrook Dairy".to_string()),
            technician: Some("J. Carter".to_string()),
            notes: String::new(),
            status: AuditStatus::Completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entry(parameter: &str, value: f64, status: ParameterStatus) -> AuditEntry {
        AuditEntry {
            id: 0,
            audit_id: Uuid::new_v4(),
            parameter: parameter.to_string(),
            value,
            unit: "in Hg".to_string(),
            category: ParameterCategory::Vacuum,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_counts_and_critical_first_ordering() {
        let catalog = GuidelineCatalog::standard();
        let entries = vec![
            entry("Milk Line Vacuum", 12.7, ParameterStatus::Low),
            entry("Claw Vacuum", 13.5, ParameterStatus::Normal),
            entry("Pulsation Vacuum", 9.0, ParameterStatus::Critical),
            entry("Vacuum Reserve", 5.3, ParameterStatus::High),
        ];

        let report = AuditReport::build(&summary(), &entries, &catalog);

        assert_eq!(report.normal_count, 1);
        assert_eq!(report.warning_count, 2);
        assert_eq!(report.critical_count, 1);
        assert_eq!(report.total_readings(), 4);

        // Critical leads; the two warnings keep their entry order
        let order: Vec<&str> = report.issues.iter().map(|i| i.parameter.as_str()).collect();
        assert_eq!(
            order,
            vec!["Pulsation Vacuum", "Milk Line Vacuum", "Vacuum Reserve"]
        );
        assert_eq!(report.farm_name.as_deref(), Some("Meadowbrook Dairy"));
    }

    #[test]
    fn test_issue_carries_range_and_recommendations() {
        let catalog = GuidelineCatalog::standard();
        let entries = vec![entry("Claw Vacuum", 11.0, ParameterStatus::Critical)];

        let report = AuditReport::build(&summary(), &entries, &catalog);
        let issue = &report.issues[0];

        assert_eq!(issue.acceptable_min, Some(12.5));
        assert_eq!(issue.acceptable_max, Some(15.0));
        // Three remediation steps plus the status note
        assert_eq!(issue.recommendations.len(), 4);
        assert!(issue.recommendations.last().unwrap().starts_with("CRITICAL"));
    }

    #[test]
    fn test_recommended_actions_are_deduplicated_and_sorted() {
        let shared = "Inspect the vacuum pump and regulator".to_string();
        let catalog = GuidelineCatalog::new(GuidelinesConfig {
            parameters: vec![
                ParameterDefinition {
                    name: "Claw Vacuum".to_string(),
                    category: ParameterCategory::Vacuum,
                    unit: "in Hg".to_string(),
                    min_value: 12.5,
                    max_value: 15.0,
                    target_value: None,
                    description: String::new(),
                    recommendations: vec![shared.clone(), "Check claw air bleeds".to_string()],
                },
                ParameterDefinition {
                    name: "Milk Line Vacuum".to_string(),
                    category: ParameterCategory::Vacuum,
                    unit: "in Hg".to_string(),
                    min_value: 13.0,
                    max_value: 15.5,
                    target_value: None,
                    description: String::new(),
                    recommendations: vec![shared.clone()],
                },
            ],
        });

        let entries = vec![
            entry("Claw Vacuum", 12.1, ParameterStatus::Low),
            entry("Milk Line Vacuum", 12.7, ParameterStatus::Low),
        ];
        let report = AuditReport::build(&summary(), &entries, &catalog);

        // The shared step appears once, the union is sorted
        assert_eq!(
            report
                .recommended_actions
                .iter()
                .filter(|a| **a == shared)
                .count(),
            1
        );
        let mut sorted = report.recommended_actions.clone();
        sorted.sort();
        assert_eq!(report.recommended_actions, sorted);
    }

    #[test]
    fn test_all_normal_means_no_issues() {
        let catalog = GuidelineCatalog::standard();
        let entries = vec![
            entry("Claw Vacuum", 13.5, ParameterStatus::Normal),
            entry("Milk Line Vacuum", 14.0, ParameterStatus::Normal),
        ];

        let report = AuditReport::build(&summary(), &entries, &catalog);

        assert_eq!(report.normal_count, 2);
        assert!(report.issues.is_empty());
        assert!(report.recommended_actions.is_empty());
    }

    #[test]
    fn test_unknown_parameter_keeps_entry_data() {
        let catalog = GuidelineCatalog::standard();
        let entries = vec![entry("Reserve CFM", 3.0, ParameterStatus::Low)];

        let report = AuditReport::build(&summary(), &entries, &catalog);
        let issue = &report.issues[0];

        assert_eq!(issue.parameter, "Reserve CFM");
        assert_eq!(issue.status, ParameterStatus::Low);
        assert!(issue.acceptable_min.is_none());
        assert!(issue.recommendations.is_empty());
    }

    #[test]
    fn test_empty_entries_builds_empty_report() {
        let catalog = GuidelineCatalog::standard();
        let report = AuditReport::build(&summary(), &[], &catalog);

        assert_eq!(report.total_readings(), 0);
        assert!(report.issues.is_empty());
        assert!(report.recommended_actions.is_empty());
    }
}

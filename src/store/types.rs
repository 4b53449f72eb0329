use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::guidelines::{ParameterCategory, ParameterStatus};
use crate::session::AuditStatus;

/// Header fields of a stored audit, for draft and history list views.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub id: Uuid,
    pub farm_id: Option<String>,
    pub farm_name: Option<String>,
    pub technician: Option<String>,
    pub notes: String,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One evaluated reading materialized when a draft is completed.
///
/// Entries are immutable apart from `correct_entry_value`, which updates
/// the value and recomputes the status together.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub audit_id: Uuid,
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub category: ParameterCategory,
    pub status: ParameterStatus,
    pub created_at: DateTime<Utc>,
}

/// A farm in the registry. Audits reference farms by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmRecord {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub contact_person: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// Reading counts aggregated over completed audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditStatistics {
    pub total_audits: usize,
    pub critical_issues: usize,
    /// Low and High readings combined
    pub warning_issues: usize,
    pub normal_readings: usize,
}

impl AuditStatistics {
    pub fn total_readings(&self) -> usize {
        self.critical_issues + self.warning_issues + self.normal_readings
    }

    pub fn critical_percentage(&self) -> f64 {
        self.percentage(self.critical_issues)
    }

    pub fn warning_percentage(&self) -> f64 {
        self.percentage(self.warning_issues)
    }

    pub fn normal_percentage(&self) -> f64 {
        self.percentage(self.normal_readings)
    }

    fn percentage(&self, count: usize) -> f64 {
        let total = self.total_readings();
        if total == 0 {
            return 0.0;
        }
        count as f64 / total as f64 * 100.0
    }
}

//! The audit session aggregate.
//!
//! `AuditSession` is the single source of truth for one audit being
//! edited. Sections start absent or empty and are materialized at
//! exactly two points: `new()` for a blank draft and `seeded()` for a
//! fresh editing session with the standard form layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{
    AuditStatus, DetacherSettings, Diagnostics, FarmInfo, MilkingTimeRow, PulsationAverage,
    PulsatorRow, RecommendationItem, VoltageChecks,
};

/// Number of milking-time rows a seeded session starts with.
const SEEDED_MILKING_ROWS: u16 = 10;
/// Number of pulsator rows a seeded session starts with.
const SEEDED_PULSATOR_ROWS: u16 = 6;

/// One audit being edited: header fields plus the eight form sections.
///
/// `Option` sections distinguish "never started" from "started but
/// empty"; progress tracking depends on that distinction. Row lists keep
/// insertion order, and their `position`/`number`/`index` fields stay
/// contiguous 1..N across removals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSession {
    pub id: Uuid,
    pub farm_id: Option<String>,
    pub notes: String,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub farm_info: Option<FarmInfo>,
    pub milking_time_rows: Vec<MilkingTimeRow>,
    pub detacher_settings: Option<DetacherSettings>,
    pub pulsator_rows: Vec<PulsatorRow>,
    pub pulsation_averages: Option<PulsationAverage>,
    pub voltage_checks: Option<VoltageChecks>,
    pub diagnostics: Option<Diagnostics>,
    pub recommendations: Vec<RecommendationItem>,
}

impl AuditSession {
    /// Blank draft with every section absent or empty. This is what the
    /// store creates when a requested audit does not exist yet.
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            farm_id: None,
            notes: String::new(),
            status: AuditStatus::Draft,
            created_at: now,
            updated_at: now,
            farm_info: None,
            milking_time_rows: Vec::new(),
            detacher_settings: None,
            pulsator_rows: Vec::new(),
            pulsation_averages: None,
            voltage_checks: None,
            diagnostics: None,
            recommendations: Vec::new(),
        }
    }

    /// Draft pre-populated with the standard form layout: 10 milking
    /// rows, 6 pulsator rows, one blank recommendation, and default
    /// section structs everywhere else.
    pub fn seeded(id: Uuid) -> Self {
        let mut session = Self::new(id);
        session.farm_info = Some(FarmInfo::default());
        session.milking_time_rows = (1..=SEEDED_MILKING_ROWS).map(MilkingTimeRow::new).collect();
        session.detacher_settings = Some(DetacherSettings::default());
        session.pulsator_rows = (1..=SEEDED_PULSATOR_ROWS).map(PulsatorRow::new).collect();
        session.pulsation_averages = Some(PulsationAverage::default());
        session.voltage_checks = Some(VoltageChecks::default());
        session.diagnostics = Some(Diagnostics::default());
        session.recommendations = vec![RecommendationItem::new(1, "")];
        session
    }

    /// Farm name shown in draft lists, taken from the farm-info section.
    pub fn farm_name(&self) -> Option<&str> {
        self.farm_info
            .as_ref()
            .map(|info| info.dairy_name.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Technician shown in draft lists, taken from the farm-info section.
    pub fn technician(&self) -> Option<&str> {
        self.farm_info
            .as_ref()
            .map(|info| info.prepared_by.as_str())
            .filter(|name| !name.is_empty())
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Row operations
    // -------------------------------------------------------------------------

    /// Append a milking row at the next position.
    pub fn add_milking_row(&mut self) {
        let next = self.milking_time_rows.last().map_or(1, |r| r.position + 1);
        self.milking_time_rows.push(MilkingTimeRow::new(next));
    }

    /// Remove the milking row at list index `idx` and renumber the rest.
    /// Out-of-range indices are ignored.
    pub fn remove_milking_row(&mut self, idx: usize) {
        if idx >= self.milking_time_rows.len() {
            return;
        }
        self.milking_time_rows.remove(idx);
        for (i, row) in self.milking_time_rows.iter_mut().enumerate() {
            row.position = (i + 1) as u16;
        }
    }

    /// Append a pulsator row at the next unit number.
    pub fn add_pulsator_row(&mut self) {
        let next = self.pulsator_rows.last().map_or(1, |r| r.number + 1);
        self.pulsator_rows.push(PulsatorRow::new(next));
    }

    /// Append a copy of the pulsator row at list index `idx` under the
    /// next unit number. Out-of-range indices are ignored.
    pub fn duplicate_pulsator_row(&mut self, idx: usize) {
        let Some(row) = self.pulsator_rows.get(idx) else {
            return;
        };
        let next = self.pulsator_rows.last().map_or(1, |r| r.number + 1);
        let copy = row.duplicate_as(next);
        self.pulsator_rows.push(copy);
    }

    /// Remove the pulsator row at list index `idx` and renumber the rest.
    /// Out-of-range indices are ignored.
    pub fn remove_pulsator_row(&mut self, idx: usize) {
        if idx >= self.pulsator_rows.len() {
            return;
        }
        self.pulsator_rows.remove(idx);
        for (i, row) in self.pulsator_rows.iter_mut().enumerate() {
            row.number = (i + 1) as u16;
        }
    }

    /// Append a blank recommendation at the next index.
    pub fn add_recommendation(&mut self) {
        let next = (self.recommendations.len() + 1) as u16;
        self.recommendations.push(RecommendationItem::new(next, ""));
    }

    /// Remove the recommendation at list index `idx` and renumber the
    /// rest. Out-of-range indices are ignored.
    pub fn remove_recommendation(&mut self, idx: usize) {
        if idx >= self.recommendations.len() {
            return;
        }
        self.recommendations.remove(idx);
        for (i, item) in self.recommendations.iter_mut().enumerate() {
            item.index = (i + 1) as u16;
        }
    }
}

//! Per-section completion tracking.
//!
//! Sidebar badges show a fill fraction and a missing-field count per
//! section. The two measures deliberately disagree about what counts:
//! progress covers every tracked field, while the missing count only
//! covers the fields a technician must fill before the audit is useful.
//! An absent section reports zero progress but the full missing count.

use super::model::AuditSession;
use super::types::AuditSection;

impl AuditSession {
    /// Completion fraction for a section, in `[0.0, 1.0]`.
    ///
    /// Absent sections and empty row lists report 0.0. The overview
    /// section is always complete.
    pub fn progress(&self, section: AuditSection) -> f64 {
        match section {
            AuditSection::FarmInfo => self.farm_info_progress(),
            AuditSection::MilkingTime => self.milking_time_progress(),
            AuditSection::Detachers => self.detachers_progress(),
            AuditSection::Pulsators => self.pulsators_progress(),
            AuditSection::Diagnostics => self.diagnostics_progress(),
            AuditSection::Recommendations => self.recommendations_progress(),
            AuditSection::Overview => 1.0,
        }
    }

    /// Count of required fields still empty in a section.
    ///
    /// Absent sections report their full required-field count
    /// (farm info 5, milking time 4, detachers 4, pulsators 3,
    /// diagnostics 7, recommendations 1). The overview is never missing
    /// anything.
    pub fn missing_count(&self, section: AuditSection) -> usize {
        match section {
            AuditSection::FarmInfo => self.farm_info_missing(),
            AuditSection::MilkingTime => self.milking_time_missing(),
            AuditSection::Detachers => self.detachers_missing(),
            AuditSection::Pulsators => self.pulsators_missing(),
            AuditSection::Diagnostics => self.diagnostics_missing(),
            AuditSection::Recommendations => self.recommendations_missing(),
            AuditSection::Overview => 0,
        }
    }

    fn farm_info_progress(&self) -> f64 {
        let Some(info) = &self.farm_info else {
            return 0.0;
        };
        // The three enum fields always carry a value; they count toward
        // progress as soon as the section exists.
        let required = [
            info.dairy_name.as_str(),
            info.prepared_by.as_str(),
            info.parlor_config.as_str(),
            info.liner_type.as_str(),
            info.system_type.as_str(),
        ];
        let completed = required.iter().filter(|f| !f.is_empty()).count();
        completed as f64 / required.len() as f64
    }

    fn farm_info_missing(&self) -> usize {
        let Some(info) = &self.farm_info else {
            return 5;
        };
        // Only the free-text identity fields can actually be missing.
        [&info.dairy_name, &info.prepared_by]
            .iter()
            .filter(|f| f.is_empty())
            .count()
    }

    fn milking_time_progress(&self) -> f64 {
        if self.milking_time_rows.is_empty() {
            return 0.0;
        }
        let total = self.milking_time_rows.len() * 4;
        let completed: usize = self
            .milking_time_rows
            .iter()
            .map(|row| {
                [row.avg_vac, row.max_vac, row.min_vac, row.flow_rate]
                    .iter()
                    .filter(|f| f.is_some())
                    .count()
            })
            .sum();
        completed as f64 / total as f64
    }

    fn milking_time_missing(&self) -> usize {
        if self.milking_time_rows.is_empty() {
            return 4;
        }
        self.milking_time_rows
            .iter()
            .map(|row| {
                [row.avg_vac, row.max_vac, row.min_vac, row.flow_rate]
                    .iter()
                    .filter(|f| f.is_none())
                    .count()
            })
            .sum()
    }

    fn detachers_progress(&self) -> f64 {
        let Some(settings) = &self.detacher_settings else {
            return 0.0;
        };
        let required = [
            settings.cluster_removal_delay,
            settings.blink_time_delay,
            settings.detach_flow_setting,
            settings.let_down_delay,
        ];
        let completed = required.iter().filter(|f| f.is_some()).count();
        completed as f64 / required.len() as f64
    }

    fn detachers_missing(&self) -> usize {
        let Some(settings) = &self.detacher_settings else {
            return 4;
        };
        [
            settings.cluster_removal_delay,
            settings.blink_time_delay,
            settings.detach_flow_setting,
            settings.let_down_delay,
        ]
        .iter()
        .filter(|f| f.is_none())
        .count()
    }

    fn pulsators_progress(&self) -> f64 {
        if self.pulsator_rows.is_empty() {
            return 0.0;
        }
        let total = self.pulsator_rows.len() * 3;
        let completed: usize = self
            .pulsator_rows
            .iter()
            .map(|row| {
                [row.ratio_front, row.ratio_rear, row.rate]
                    .iter()
                    .filter(|f| f.is_some())
                    .count()
            })
            .sum();
        completed as f64 / total as f64
    }

    fn pulsators_missing(&self) -> usize {
        if self.pulsator_rows.is_empty() {
            return 3;
        }
        self.pulsator_rows
            .iter()
            .map(|row| {
                [row.ratio_front, row.ratio_rear, row.rate]
                    .iter()
                    .filter(|f| f.is_none())
                    .count()
            })
            .sum()
    }

    fn diagnostics_progress(&self) -> f64 {
        let Some(diag) = &self.diagnostics else {
            return 0.0;
        };
        let readings = diag.receiver_readings();
        let completed = readings.iter().filter(|f| f.is_some()).count();
        completed as f64 / readings.len() as f64
    }

    fn diagnostics_missing(&self) -> usize {
        let Some(diag) = &self.diagnostics else {
            return 7;
        };
        diag.receiver_readings().iter().filter(|f| f.is_none()).count()
    }

    fn recommendations_progress(&self) -> f64 {
        if self.recommendations.is_empty() {
            return 0.0;
        }
        let completed = self
            .recommendations
            .iter()
            .filter(|r| !r.text.is_empty())
            .count();
        completed as f64 / self.recommendations.len() as f64
    }

    fn recommendations_missing(&self) -> usize {
        if self.recommendations.is_empty() {
            return 1;
        }
        self.recommendations
            .iter()
            .filter(|r| r.text.is_empty())
            .count()
    }
}

//! Section data types for an audit session.
//!
//! Each section of the audit form is a plain serde struct. Sections are
//! persisted independently as JSON blobs, so every type here must keep a
//! stable serialized shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// AUDIT-LEVEL ENUMS
// =============================================================================

/// Lifecycle state of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Draft,
    Completed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Draft => "draft",
            AuditStatus::Completed => "completed",
        }
    }

    pub fn from_str(input: &str) -> AuditStatus {
        match input {
            "completed" => AuditStatus::Completed,
            _ => AuditStatus::Draft,
        }
    }
}

/// The seven sections of the audit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSection {
    FarmInfo,
    MilkingTime,
    Detachers,
    Pulsators,
    Diagnostics,
    Recommendations,
    Overview,
}

impl AuditSection {
    pub const ALL: [AuditSection; 7] = [
        AuditSection::FarmInfo,
        AuditSection::MilkingTime,
        AuditSection::Detachers,
        AuditSection::Pulsators,
        AuditSection::Diagnostics,
        AuditSection::Recommendations,
        AuditSection::Overview,
    ];

    /// Display title used by section headers and navigation.
    pub fn title(&self) -> &'static str {
        match self {
            AuditSection::FarmInfo => "Farm Info",
            AuditSection::MilkingTime => "Milking Time",
            AuditSection::Detachers => "Detachers",
            AuditSection::Pulsators => "Pulsators",
            AuditSection::Diagnostics => "Diagnostics",
            AuditSection::Recommendations => "Recommendations",
            AuditSection::Overview => "Overview",
        }
    }
}

// =============================================================================
// FARM INFO
// =============================================================================

/// Parlor layout configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParlorType {
    Rotary,
    Parallel,
    Herringbone,
    Robot,
    #[default]
    Other,
}

impl ParlorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParlorType::Rotary => "rotary",
            ParlorType::Parallel => "parallel",
            ParlorType::Herringbone => "herringbone",
            ParlorType::Robot => "robot",
            ParlorType::Other => "other",
        }
    }
}

/// Liner styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinerType {
    #[default]
    Classic,
    Other,
}

impl LinerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinerType::Classic => "classic",
            LinerType::Other => "other",
        }
    }
}

/// Milk hose inner diameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HoseSize {
    #[default]
    #[serde(rename = "5/8\"")]
    FiveEighths,
    #[serde(rename = "3/4\"")]
    ThreeQuarters,
    #[serde(rename = "7/8\"")]
    SevenEighths,
}

impl HoseSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoseSize::FiveEighths => "5/8\"",
            HoseSize::ThreeQuarters => "3/4\"",
            HoseSize::SevenEighths => "7/8\"",
        }
    }
}

/// Milk line routing configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemType {
    HighLine,
    MidLine,
    LowLine,
    SingleTop,
    DoubleLoop,
    #[default]
    Other,
}

impl SystemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemType::HighLine => "highLine",
            SystemType::MidLine => "midLine",
            SystemType::LowLine => "lowLine",
            SystemType::SingleTop => "singleTop",
            SystemType::DoubleLoop => "doubleLoop",
            SystemType::Other => "other",
        }
    }
}

/// Dairy identity, contacts and system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmInfo {
    pub dairy_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub date: DateTime<Utc>,
    pub prepared_by: String,
    pub contact_name: String,
    pub phone: String,
    pub email: String,
    pub number_of_cows: u32,
    pub number_of_stalls: u32,
    /// Milkings per day (2x, 3x)
    pub milking_frequency: u8,
    pub parlor_config: ParlorType,
    pub liner_type: LinerType,
    pub milk_hose_id: HoseSize,
    pub milk_production_lbs: Option<f64>,
    /// Somatic cell count, if the dairy shared it
    pub scc: Option<u32>,
    pub system_type: SystemType,
    /// Inner diameters of the milk line runs (free text, e.g. "3\"")
    pub milk_line_ids: Vec<String>,
    pub milk_line_slope: Option<f64>,
    pub vacuum_pump_hp: Option<f64>,
    pub has_vfd: Option<bool>,
}

impl Default for FarmInfo {
    fn default() -> Self {
        Self {
            dairy_name: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            date: Utc::now(),
            prepared_by: String::new(),
            contact_name: String::new(),
            phone: String::new(),
            email: String::new(),
            number_of_cows: 0,
            number_of_stalls: 0,
            milking_frequency: 0,
            parlor_config: ParlorType::default(),
            liner_type: LinerType::default(),
            milk_hose_id: HoseSize::default(),
            milk_production_lbs: None,
            scc: None,
            system_type: SystemType::default(),
            milk_line_ids: Vec::new(),
            milk_line_slope: None,
            vacuum_pump_hp: None,
            has_vfd: None,
        }
    }
}

// =============================================================================
// MEASUREMENT ROWS
// =============================================================================

/// One cow's milking-time measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkingTimeRow {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Stall/cow position, contiguous 1..N
    pub position: u16,
    pub avg_vac: Option<f64>,
    pub max_vac: Option<f64>,
    pub min_vac: Option<f64>,
    pub fluctuation: Option<f64>,
    pub flow_rate: Option<f64>,
    pub strip_yield: Option<f64>,
    pub stimulation_time: Option<f64>,
}

impl MilkingTimeRow {
    pub fn new(position: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            avg_vac: None,
            max_vac: None,
            min_vac: None,
            fluctuation: None,
            flow_rate: None,
            strip_yield: None,
            stimulation_time: None,
        }
    }
}

/// Automatic detacher settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetacherSettings {
    pub cluster_removal_delay: Option<f64>,
    pub blink_time_delay: Option<f64>,
    pub detach_flow_setting: Option<f64>,
    pub let_down_delay: Option<f64>,
    pub notes: String,
}

/// One pulsator unit's timing measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulsatorRow {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Unit number, contiguous 1..N
    pub number: u16,
    pub ratio_front: Option<f64>,
    pub ratio_rear: Option<f64>,
    pub a_front: Option<f64>,
    pub a_rear: Option<f64>,
    pub b_front: Option<f64>,
    pub b_rear: Option<f64>,
    pub c_front: Option<f64>,
    pub c_rear: Option<f64>,
    pub d_front: Option<f64>,
    pub d_rear: Option<f64>,
    pub rate: Option<f64>,
}

impl PulsatorRow {
    pub fn new(number: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            ratio_front: None,
            ratio_rear: None,
            a_front: None,
            a_rear: None,
            b_front: None,
            b_rear: None,
            c_front: None,
            c_rear: None,
            d_front: None,
            d_rear: None,
            rate: None,
        }
    }

    /// Copy of this row's readings under a new unit number (fresh id).
    pub fn duplicate_as(&self, number: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            ..self.clone()
        }
    }
}

/// Parlor-wide pulsation averages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PulsationAverage {
    pub ratio1: Option<f64>,
    pub ratio2: Option<f64>,
    pub a_phase: Option<f64>,
    pub b_phase: Option<f64>,
    pub c_phase: Option<f64>,
    pub d_phase: Option<f64>,
    pub rate: Option<f64>,
}

/// Stray-voltage spot checks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoltageChecks {
    pub at_control: Option<f64>,
    pub at_last: Option<f64>,
    pub at_other: Option<f64>,
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Seven-step vacuum diagnostic readings.
///
/// Step 1 is taken with all units operating and anchors the over/under
/// comparisons for the remaining steps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub step1_receiver_vac: Option<f64>,
    pub step1_regulator_vac: Option<f64>,
    pub step1_pulsator_airline_vac: Option<f64>,
    pub step1_pump_inlet_vac: Option<f64>,
    pub step1_farm_gauge: Option<f64>,
    pub step2_receiver_vac: Option<f64>,
    pub step2_regulator_vac: Option<f64>,
    pub step3_receiver_vac: Option<f64>,
    pub step3_regulator_vac: Option<f64>,
    pub step4_receiver_vac: Option<f64>,
    pub step4_regulator_vac: Option<f64>,
    pub step5_receiver_vac: Option<f64>,
    pub step5_regulator_vac: Option<f64>,
    pub step6_receiver_vac: Option<f64>,
    pub step6_regulator_vac: Option<f64>,
    pub step7_receiver_vac: Option<f64>,
    pub step7_regulator_vac: Option<f64>,
}

impl Diagnostics {
    /// The seven receiver readings in step order. These are the fields
    /// progress tracking counts.
    pub fn receiver_readings(&self) -> [Option<f64>; 7] {
        [
            self.step1_receiver_vac,
            self.step2_receiver_vac,
            self.step3_receiver_vac,
            self.step4_receiver_vac,
            self.step5_receiver_vac,
            self.step6_receiver_vac,
            self.step7_receiver_vac,
        ]
    }

    /// Over/under reading for steps 2 through 7, relative to step 1's
    /// receiver vacuum, rounded to one decimal. Steps 4 and 7 measure in
    /// the opposite direction. Returns `None` for other step numbers or
    /// when either operand is missing.
    pub fn over_under(&self, step: u8) -> Option<f64> {
        let step1 = self.step1_receiver_vac?;
        let (other, reversed) = match step {
            2 => (self.step2_receiver_vac?, false),
            3 => (self.step3_receiver_vac?, false),
            4 => (self.step4_receiver_vac?, true),
            5 => (self.step5_receiver_vac?, false),
            6 => (self.step6_receiver_vac?, false),
            7 => (self.step7_receiver_vac?, true),
            _ => return None,
        };
        let delta = if reversed { other - step1 } else { step1 - other };
        Some(round_one(delta))
    }
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// =============================================================================
// RECOMMENDATIONS
// =============================================================================

/// One free-text recommendation line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Display index, contiguous 1..N
    pub index: u16,
    pub text: String,
}

impl RecommendationItem {
    pub fn new(index: u16, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            index,
            text: text.into(),
        }
    }
}

//! Audit session aggregate, section types and completion tracking.
//!
//! An `AuditSession` holds everything one audit captures: the farm-info
//! header, per-cow milking rows, detacher settings, pulsator rows and
//! averages, voltage checks, the seven-step vacuum diagnostics, and
//! free-text recommendations. Progress and missing-field counts drive
//! the section badges in the host UI.

mod model;
mod progress;
mod types;

pub use model::AuditSession;
pub use types::*;

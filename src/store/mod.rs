//! SQLite persistence for audits, evaluated entries and farms.
//!
//! The audit table stores header columns for listing plus one JSON blob
//! per form section, so sections evolve independently and a damaged blob
//! only costs its own section. Entries are materialized rows created
//! when a draft is completed.

mod audit_store;
mod types;

pub use audit_store::AuditStore;
pub use types::{AuditEntry, AuditStatistics, AuditSummary, FarmRecord};

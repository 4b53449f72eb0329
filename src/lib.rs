//! Milking-system audit engine: guideline evaluation, session editing
//! with debounced autosave, SQLite-backed audit history and report
//! assembly for dairy parlor performance audits.

use std::path::PathBuf;

pub mod autosave;
mod error;
pub mod guidelines;
pub mod report;
pub mod session;
pub mod store;
pub mod workspace;

pub use autosave::{Autosave, SaveState, SaveStatus};
pub use error::AuditError;
pub use guidelines::{GuidelineCatalog, ParameterCategory, ParameterStatus};
pub use report::{AuditIssue, AuditReport};
pub use session::{AuditSection, AuditSession, AuditStatus};
pub use store::{AuditEntry, AuditStatistics, AuditStore, AuditSummary, FarmRecord};
pub use workspace::AuditWorkspace;

/// Install the default tracing subscriber. Host applications call this
/// once at startup; `RUST_LOG` overrides the default "info" filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Default location for the audit database, under the per-user data
/// directory. `None` when the platform has no data directory.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("ParlorAudit").join("audits.db"))
}

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit not found: {0}")]
    AuditNotFound(Uuid),

    #[error("Audit entry not found: {0}")]
    EntryNotFound(i64),

    #[error("Farm not found: {0}")]
    FarmNotFound(Uuid),

    #[error("Corrupt store data: {0}")]
    Corrupt(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Guideline error: {0}")]
    Guidelines(String),
}

impl From<AuditError> for String {
    fn from(err: AuditError) -> Self {
        err.to_string()
    }
}

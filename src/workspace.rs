//! The editing surface for one audit.
//!
//! `AuditWorkspace` owns the in-memory session and keeps a background
//! autosave worker fed with snapshots, so callers edit through
//! [`AuditWorkspace::mutate`] and never touch the store directly while
//! an audit is open. Store access happens on the blocking pool.

use std::path::PathBuf;

use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use crate::autosave::{Autosave, SaveStatus};
use crate::error::AuditError;
use crate::guidelines::GuidelineCatalog;
use crate::session::AuditSession;
use crate::store::{AuditEntry, AuditStore};

/// One open audit: the live session plus its autosave worker.
pub struct AuditWorkspace {
    db_path: PathBuf,
    session: AuditSession,
    autosave: Autosave,
}

impl AuditWorkspace {
    /// Open the audit with the given id, creating a blank draft if it
    /// does not exist. Resuming and starting fresh are the same call.
    pub async fn open(db_path: impl Into<PathBuf>, id: Uuid) -> Result<Self, AuditError> {
        let db_path = db_path.into();
        let path = db_path.clone();
        let session = tokio::task::spawn_blocking(move || {
            let store = AuditStore::new(&path)?;
            store.load_or_create(id)
        })
        .await
        .map_err(|e| AuditError::TaskFailed(format!("load task panicked: {}", e)))??;

        let autosave = Autosave::start(db_path.clone());
        info!("Opened audit {} ({})", id, session.status.as_str());
        Ok(Self {
            db_path,
            session,
            autosave,
        })
    }

    /// Start a new audit pre-populated with the standard form layout
    /// and persist it right away.
    pub async fn create_seeded(db_path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let db_path = db_path.into();
        let path = db_path.clone();
        let session = tokio::task::spawn_blocking(move || {
            let session = AuditSession::seeded(Uuid::new_v4());
            let store = AuditStore::new(&path)?;
            store.save(&session)?;
            Ok::<_, AuditError>(session)
        })
        .await
        .map_err(|e| AuditError::TaskFailed(format!("create task panicked: {}", e)))??;

        let autosave = Autosave::start(db_path.clone());
        info!("Created seeded audit {}", session.id);
        Ok(Self {
            db_path,
            session,
            autosave,
        })
    }

    pub fn id(&self) -> Uuid {
        self.session.id
    }

    /// The session being edited. Progress and section data are read
    /// from here.
    pub fn session(&self) -> &AuditSession {
        &self.session
    }

    /// Apply an edit. The modification timestamp is bumped and a
    /// snapshot is handed to the autosave worker, which writes it after
    /// the quiet period.
    pub fn mutate<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut AuditSession),
    {
        edit(&mut self.session);
        self.session.touch();
        self.autosave.touch(&self.session);
    }

    /// Persist any unsaved edits now instead of waiting out the quiet
    /// period.
    pub async fn save_draft(&self) -> Result<(), AuditError> {
        self.autosave.flush().await
    }

    /// Current autosave status.
    pub fn save_status(&self) -> SaveStatus {
        self.autosave.status()
    }

    /// Status change notifications, for save indicators.
    pub fn subscribe_saves(&self) -> watch::Receiver<SaveStatus> {
        self.autosave.subscribe()
    }

    /// Complete the audit: flush outstanding edits, stop the autosave
    /// worker and materialize the evaluated entries. The workspace is
    /// consumed; a completed audit is read back through the store.
    pub async fn finish(self, catalog: &GuidelineCatalog) -> Result<Vec<AuditEntry>, AuditError> {
        let id = self.session.id;
        let db_path = self.db_path.clone();
        self.autosave.shutdown().await?;

        let catalog = catalog.clone();
        tokio::task::spawn_blocking(move || {
            let mut store = AuditStore::new(&db_path)?;
            store.complete_draft(id, &catalog)
        })
        .await
        .map_err(|e| AuditError::TaskFailed(format!("completion task panicked: {}", e)))?
    }

    /// Flush outstanding edits and stop the autosave worker, leaving
    /// the audit as a draft to resume later.
    pub async fn close(self) -> Result<(), AuditError> {
        let id = self.session.id;
        self.autosave.shutdown().await?;
        info!("Closed draft audit {}", id);
        Ok(())
    }
}

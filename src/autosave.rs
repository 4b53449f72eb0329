//! Debounced background persistence for the audit being edited.
//!
//! Every mutation hands the controller a snapshot of the session. The
//! controller waits for a quiet period before writing, so a burst of
//! keystrokes costs one disk write instead of dozens. Saves run on the
//! blocking pool and are serialized; a snapshot that arrives mid-save is
//! queued and gets its own full quiet period afterwards.
//!
//! A failed save parks the snapshot instead of retrying on a timer. The
//! next mutation or explicit flush retries it, and the failure is
//! surfaced on the observable [`SaveStatus`] in the meantime.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::error::AuditError;
use crate::session::AuditSession;
use crate::store::AuditStore;

/// How long the session must stay untouched before a pending snapshot
/// is written.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Where the controller is in its save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveState {
    /// Everything persisted.
    Idle,
    /// Unsaved changes are waiting for the quiet period (or parked
    /// after a failed save).
    Dirty,
    /// A write is in flight.
    Saving,
}

/// Observable persistence status, published on a watch channel so UIs
/// can show an unobtrusive indicator.
#[derive(Debug, Clone, Serialize)]
pub struct SaveStatus {
    pub state: SaveState,
    pub last_saved: Option<DateTime<Utc>>,
    pub last_save_error: Option<String>,
}

impl SaveStatus {
    fn initial() -> Self {
        Self {
            state: SaveState::Idle,
            last_saved: None,
            last_save_error: None,
        }
    }
}

enum Command {
    Touch(Box<AuditSession>),
    Flush(oneshot::Sender<Result<(), AuditError>>),
}

/// Handle to the background autosave worker.
pub struct Autosave {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
    worker: JoinHandle<()>,
}

impl Autosave {
    /// Start a worker saving to `db_path` with the default quiet period.
    pub fn start(db_path: PathBuf) -> Self {
        Self::with_quiet_period(db_path, DEFAULT_QUIET_PERIOD)
    }

    /// Start a worker with an explicit quiet period.
    pub fn with_quiet_period(db_path: PathBuf, quiet_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::initial());

        let worker = tokio::spawn(
            Worker {
                db_path,
                quiet_period,
                rx,
                status_tx,
                pending: None,
                deadline: None,
            }
            .run(),
        );

        Self { tx, status, worker }
    }

    /// Record a mutation. The snapshot replaces any pending one and the
    /// quiet period starts over.
    pub fn touch(&self, session: &AuditSession) {
        let snapshot = Box::new(session.clone());
        if self.tx.send(Command::Touch(snapshot)).is_err() {
            warn!("Autosave worker is gone, dropping snapshot");
        }
    }

    /// Write any pending snapshot now and wait for the result. With
    /// nothing pending this returns immediately.
    pub async fn flush(&self) -> Result<(), AuditError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply_tx))
            .map_err(|_| AuditError::TaskFailed("autosave worker stopped".to_string()))?;
        reply_rx
            .await
            .map_err(|_| AuditError::TaskFailed("autosave worker stopped".to_string()))?
    }

    /// Current persistence status.
    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// A receiver for status changes, for indicators that want to react
    /// instead of poll.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Flush pending work and stop the worker.
    pub async fn shutdown(self) -> Result<(), AuditError> {
        let result = self.flush().await;
        let Autosave { tx, worker, .. } = self;
        drop(tx);
        if let Err(e) = worker.await {
            warn!("Autosave worker did not stop cleanly: {}", e);
        }
        result
    }
}

struct Worker {
    db_path: PathBuf,
    quiet_period: Duration,
    rx: mpsc::UnboundedReceiver<Command>,
    status_tx: watch::Sender<SaveStatus>,
    pending: Option<Box<AuditSession>>,
    deadline: Option<Instant>,
}

impl Worker {
    async fn run(mut self) {
        debug!("Autosave worker started for {:?}", self.db_path);
        loop {
            let command = match self.deadline {
                // Commands win over an expired timer so a flush that is
                // already queued gets the reply it is waiting for.
                Some(at) => tokio::select! {
                    biased;
                    cmd = self.rx.recv() => match cmd {
                        Some(cmd) => Some(cmd),
                        None => break,
                    },
                    _ = sleep_until(at) => None,
                },
                // Nothing pending (or a failed save parked): sleep until
                // the next command.
                None => match self.rx.recv().await {
                    Some(cmd) => Some(cmd),
                    None => break,
                },
            };

            match command {
                Some(Command::Touch(snapshot)) => {
                    self.pending = Some(snapshot);
                    self.deadline = Some(Instant::now() + self.quiet_period);
                    self.status_tx.send_modify(|s| s.state = SaveState::Dirty);
                }
                Some(Command::Flush(reply)) => {
                    let result = self.save_pending().await;
                    let _ = reply.send(result);
                }
                None => {
                    // Quiet period elapsed
                    if let Err(e) = self.save_pending().await {
                        warn!("Autosave failed: {}", e);
                    }
                }
            }
        }

        // Channel closed: one last chance for anything still pending
        if let Err(e) = self.save_pending().await {
            warn!("Final autosave failed: {}", e);
        }
        debug!("Autosave worker stopped");
    }

    async fn save_pending(&mut self) -> Result<(), AuditError> {
        let Some(snapshot) = self.pending.take() else {
            return Ok(());
        };
        self.deadline = None;
        self.status_tx.send_modify(|s| s.state = SaveState::Saving);

        let db_path = self.db_path.clone();
        let audit_id = snapshot.id;
        let result = tokio::task::spawn_blocking(move || {
            let outcome = AuditStore::new(&db_path).and_then(|store| store.save(&snapshot));
            (outcome, snapshot)
        })
        .await;

        match result {
            Ok((Ok(()), _)) => {
                debug!("Autosaved audit {}", audit_id);
                self.status_tx.send_modify(|s| {
                    s.state = SaveState::Idle;
                    s.last_saved = Some(Utc::now());
                    s.last_save_error = None;
                });
                Ok(())
            }
            Ok((Err(e), snapshot)) => {
                // Keep the snapshot so a later flush or the final
                // shutdown pass can still land it
                self.pending = Some(snapshot);
                self.park_failed_snapshot(audit_id, e.to_string());
                Err(e)
            }
            Err(join_err) => {
                let message = format!("save task panicked: {}", join_err);
                self.park_failed_snapshot(audit_id, message.clone());
                Err(AuditError::TaskFailed(message))
            }
        }
    }

    /// Keep the state Dirty and wait for the next touch or flush; there
    /// is no retry timer.
    fn park_failed_snapshot(&mut self, audit_id: uuid::Uuid, message: String) {
        warn!("Autosave of audit {} failed: {}", audit_id, message);
        self.status_tx.send_modify(|s| {
            s.state = SaveState::Dirty;
            s.last_save_error = Some(message);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::time::advance;
    use uuid::Uuid;

    /// Let the worker drain its command queue without advancing time.
    async fn drain() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn edited_session(id: Uuid) -> AuditSession {
        let mut session = AuditSession::seeded(id);
        session.notes = "Checked during morning milking".to_string();
        session
    }

    fn stored_session(dir: &TempDir, id: Uuid) -> Option<AuditSession> {
        let store = AuditStore::new(&dir.path().join("audits.db")).unwrap();
        store.get(id).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle() {
        let dir = TempDir::new().unwrap();
        let autosave = Autosave::start(dir.path().join("audits.db"));

        let status = autosave.status();
        assert_eq!(status.state, SaveState::Idle);
        assert!(status.last_saved.is_none());
        assert!(status.last_save_error.is_none());

        autosave.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_waits_out_the_quiet_period() {
        let dir = TempDir::new().unwrap();
        let id = Uuid::new_v4();
        let autosave = Autosave::start(dir.path().join("audits.db"));

        autosave.touch(&edited_session(id));
        drain().await;
        assert_eq!(autosave.status().state, SaveState::Dirty);

        // Just shy of the quiet period: still unsaved
        advance(Duration::from_millis(1900)).await;
        drain().await;
        assert_eq!(autosave.status().state, SaveState::Dirty);
        assert!(stored_session(&dir, id).is_none());

        // Crossing it triggers the save
        advance(Duration::from_millis(200)).await;
        let mut rx = autosave.subscribe();
        let status = rx
            .wait_for(|s| s.state == SaveState::Idle)
            .await
            .unwrap()
            .clone();
        assert!(status.last_saved.is_some());
        assert!(status.last_save_error.is_none());

        let saved = stored_session(&dir, id).expect("autosave should have written");
        assert_eq!(saved.notes, "Checked during morning milking");

        autosave.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_touch_restarts_the_quiet_period() {
        let dir = TempDir::new().unwrap();
        let id = Uuid::new_v4();
        let autosave = Autosave::start(dir.path().join("audits.db"));

        autosave.touch(&edited_session(id));
        drain().await;
        advance(Duration::from_millis(1500)).await;

        // A second edit before the deadline pushes it out
        let mut newer = edited_session(id);
        newer.notes = "Second edit".to_string();
        autosave.touch(&newer);
        drain().await;

        // The original deadline passes with nothing written
        advance(Duration::from_millis(1000)).await;
        drain().await;
        assert!(stored_session(&dir, id).is_none());

        // The restarted one fires, with the latest snapshot
        advance(Duration::from_millis(1100)).await;
        let mut rx = autosave.subscribe();
        rx.wait_for(|s| s.state == SaveState::Idle).await.unwrap();
        let saved = stored_session(&dir, id).unwrap();
        assert_eq!(saved.notes, "Second edit");

        autosave.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_skips_the_wait() {
        let dir = TempDir::new().unwrap();
        let id = Uuid::new_v4();
        let autosave = Autosave::start(dir.path().join("audits.db"));

        // Flushing with nothing pending is an immediate success
        autosave.flush().await.unwrap();
        assert!(autosave.status().last_saved.is_none());

        autosave.touch(&edited_session(id));
        autosave.flush().await.unwrap();

        assert!(stored_session(&dir, id).is_some());
        let status = autosave.status();
        assert_eq!(status.state, SaveState::Idle);
        assert!(status.last_saved.is_some());

        autosave.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_parks_until_retried() {
        let dir = TempDir::new().unwrap();
        // A file where the db's parent directory should be makes every
        // open fail
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let db_path = blocker.join("audits.db");

        let id = Uuid::new_v4();
        let autosave = Autosave::start(db_path.clone());

        autosave.touch(&edited_session(id));
        let mut rx = autosave.subscribe();
        advance(Duration::from_millis(2100)).await;
        let status = rx
            .wait_for(|s| s.last_save_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(status.state, SaveState::Dirty);
        assert!(status.last_saved.is_none());

        // Parked: a long silence brings no retry and no status change
        rx.borrow_and_update();
        tokio::select! {
            _ = rx.changed() => panic!("parked save should not retry on its own"),
            _ = tokio::time::sleep(Duration::from_secs(300)) => {}
        }

        // An explicit flush retries and reports the failure
        assert!(autosave.flush().await.is_err());

        // Clearing the obstruction and touching again recovers
        std::fs::remove_file(&blocker).unwrap();
        autosave.touch(&edited_session(id));
        advance(Duration::from_millis(2100)).await;
        let status = rx
            .wait_for(|s| s.state == SaveState::Idle)
            .await
            .unwrap()
            .clone();
        assert!(status.last_save_error.is_none());
        assert!(status.last_saved.is_some());

        let store = AuditStore::new(&db_path).unwrap();
        assert!(store.get(id).unwrap().is_some());

        autosave.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_snapshot() {
        let dir = TempDir::new().unwrap();
        let id = Uuid::new_v4();
        let autosave = Autosave::start(dir.path().join("audits.db"));

        // Well inside the quiet period
        autosave.touch(&edited_session(id));
        autosave.shutdown().await.unwrap();

        assert!(stored_session(&dir, id).is_some());
    }
}

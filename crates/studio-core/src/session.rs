//! Best-effort session persistence
//!
//! Each studio session is stored as one JSON document keyed by a random
//! UUID. Writes are debounced and failures are only logged. The one save
//! anything waits on is the final flush at shutdown.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::proposal::Proposal;
use crate::state::ChatMessage;

pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(600);

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Everything needed to resume a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioState {
    #[serde(default)]
    pub initial_desc: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub proposal: Option<Proposal>,
}

pub trait SessionStore: Send + Sync {
    fn upsert(&self, session_id: &str, state: &StudioState) -> Result<()>;
    fn fetch(&self, session_id: &str) -> Result<Option<StudioState>>;
}

pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS studio_sessions (
                id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))
    }
}

impl SessionStore for SqliteSessionStore {
    fn upsert(&self, session_id: &str, state: &StudioState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.lock()?.execute(
            "INSERT INTO studio_sessions (id, state, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![session_id, json],
        )?;
        Ok(())
    }

    fn fetch(&self, session_id: &str) -> Result<Option<StudioState>> {
        let json: Option<String> = self
            .lock()?
            .query_row(
                "SELECT state FROM studio_sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// Debounced writer: each call to [`schedule`](Self::schedule) replaces the
/// pending save, so only the last state in a burst is written.
pub struct SessionSaver {
    store: Arc<dyn SessionStore>,
    session_id: String,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl SessionSaver {
    pub fn new(store: Arc<dyn SessionStore>, session_id: String) -> Self {
        Self {
            store,
            session_id,
            delay: SAVE_DEBOUNCE,
            pending: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, state: StudioState) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        let store = Arc::clone(&self.store);
        let session_id = self.session_id.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let id = session_id.clone();
            let result =
                tokio::task::spawn_blocking(move || store.upsert(&id, &state)).await;
            match result {
                Ok(Ok(())) => debug!(session_id = %session_id, "session saved"),
                Ok(Err(e)) => warn!(session_id = %session_id, error = %e, "session save failed"),
                Err(e) => warn!(session_id = %session_id, error = %e, "session save task failed"),
            }
        }));
    }

    /// Drop any pending save and write `state` now, on the calling thread.
    pub fn flush(&mut self, state: StudioState) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        match self.store.upsert(&self.session_id, &state) {
            Ok(()) => debug!(session_id = %self.session_id, "session flushed"),
            Err(e) => warn!(session_id = %self.session_id, error = %e, "session flush failed"),
        }
    }
}

impl Drop for SessionSaver {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> StudioState {
        StudioState {
            initial_desc: Some("Booking app".to_string()),
            messages: vec![
                ChatMessage::user("Booking app"),
                ChatMessage::assistant("Suggested schedule:"),
            ],
            proposal: Some(Proposal {
                title: "Bookings".to_string(),
                ..Default::default()
            }),
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<(String, StudioState)>>,
    }

    impl SessionStore for RecordingStore {
        fn upsert(&self, session_id: &str, state: &StudioState) -> Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push((session_id.to_string(), state.clone()));
            Ok(())
        }

        fn fetch(&self, _session_id: &str) -> Result<Option<StudioState>> {
            Ok(None)
        }
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn upsert(&self, _session_id: &str, _state: &StudioState) -> Result<()> {
            Err(anyhow!("database is locked"))
        }

        fn fetch(&self, _session_id: &str) -> Result<Option<StudioState>> {
            Err(anyhow!("database is locked"))
        }
    }

    #[test]
    fn test_sqlite_upsert_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteSessionStore::open(&dir.path().join("db").join("sessions.db")).unwrap();
        let id = new_session_id();

        assert_eq!(store.fetch(&id).unwrap(), None);

        let mut state = sample_state();
        store.upsert(&id, &state).unwrap();
        assert_eq!(store.fetch(&id).unwrap(), Some(state.clone()));

        state.messages.push(ChatMessage::user("Add payments"));
        store.upsert(&id, &state).unwrap();
        assert_eq!(store.fetch(&id).unwrap().unwrap().messages.len(), 3);

        let count: i64 = store
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM studio_sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_state_json_shape() {
        let json = serde_json::to_value(sample_state()).unwrap();
        assert_eq!(json["initialDesc"], "Booking app");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["proposal"]["title"], "Bookings");
    }

    #[test]
    fn test_session_ids_are_unique_uuids() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_saver_debounces_bursts() {
        let store = Arc::new(RecordingStore::default());
        let mut saver = SessionSaver::new(store.clone(), "s1".to_string());

        for n in 0..5 {
            let mut state = sample_state();
            state.initial_desc = Some(format!("draft {}", n));
            saver.schedule(state);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(store.writes.lock().unwrap().is_empty());

        tokio::time::sleep(SAVE_DEBOUNCE).await;
        // Let the blocking write finish.
        while store.writes.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "s1");
        assert_eq!(writes[0].1.initial_desc.as_deref(), Some("draft 4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_latest_state_immediately() {
        let store = Arc::new(SqliteSessionStore::in_memory().unwrap());
        let mut saver = SessionSaver::new(store.clone(), "s3".to_string());

        saver.schedule(sample_state());
        let mut last = sample_state();
        last.messages.push(ChatMessage::user("Add payments"));
        saver.flush(last.clone());

        assert_eq!(store.fetch("s3").unwrap(), Some(last.clone()));
        assert!(saver.pending.is_none());

        // The aborted debounce never overwrites the flushed state.
        drop(saver);
        tokio::time::sleep(SAVE_DEBOUNCE * 2).await;
        assert_eq!(store.fetch("s3").unwrap(), Some(last));
    }

    #[tokio::test]
    async fn test_flush_swallows_failures() {
        let mut saver = SessionSaver::new(Arc::new(FailingStore), "s4".to_string());
        saver.flush(sample_state());
        assert!(saver.pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_saver_swallows_failures() {
        let mut saver = SessionSaver::new(Arc::new(FailingStore), "s2".to_string());
        saver.schedule(sample_state());
        tokio::time::sleep(SAVE_DEBOUNCE * 2).await;
        let pending = saver.pending.take().unwrap();
        assert!(pending.await.is_ok());
    }
}

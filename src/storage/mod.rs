//! Durable mirror of the edit history: one session record in a small
//! file-backed key-value store, written from a background thread.

mod mirror;

pub use mirror::SessionMirror;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::Snapshot;
use crate::history::HistoryState;

/// Constant key under which the single session record lives.
pub const SESSION_RECORD_ID: &str = "current-session";
const RECORD_EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid record key {key:?}")]
    InvalidKey { key: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode session record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("session record at {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// In-memory form of the persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: String,
    pub history: Vec<Snapshot>,
    pub current_index: i64,
    pub timestamp: u64,
}

impl SessionRecord {
    pub fn from_history(history: &HistoryState) -> Self {
        Self {
            id: SESSION_RECORD_ID.to_string(),
            history: history.snapshots().to_vec(),
            current_index: history.current_index(),
            timestamp: unix_millis(),
        }
    }

    pub fn into_history(self) -> HistoryState {
        HistoryState::restore(self.history, self.current_index)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    id: String,
    history: Vec<StoredSnapshot>,
    current_index: i64,
    timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSnapshot {
    name: String,
    mime: String,
    data: String,
}

impl StoredSession {
    fn encode(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            history: record
                .history
                .iter()
                .map(|snapshot| StoredSnapshot {
                    name: snapshot.name().to_string(),
                    mime: snapshot.mime().to_string(),
                    data: BASE64.encode(snapshot.bytes()),
                })
                .collect(),
            current_index: record.current_index,
            timestamp: record.timestamp,
        }
    }

    fn decode(self, path: &Path) -> StorageResult<SessionRecord> {
        let history = self
            .history
            .into_iter()
            .map(|stored| {
                let bytes = BASE64
                    .decode(stored.data.as_bytes())
                    .map_err(|err| StorageError::Corrupt {
                        path: path.to_path_buf(),
                        message: format!("snapshot {}: {err}", stored.name),
                    })?;
                Ok(Snapshot::new(bytes, stored.mime, stored.name))
            })
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(SessionRecord {
            id: self.id,
            history,
            current_index: self.current_index,
            timestamp: self.timestamp,
        })
    }
}

/// Persistence contract. Implementations never see the live history; they
/// only receive detached records.
pub trait SessionStore: Send {
    fn save(&self, record: &SessionRecord) -> StorageResult<()>;
    fn load(&self) -> StorageResult<Option<SessionRecord>>;
    fn clear(&self) -> StorageResult<()>;
}

/// Key-value store with one JSON document per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn with_dir(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn validate_key(key: &str) -> StorageResult<()> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    pub fn path_for_key(&self, key: &str) -> StorageResult<PathBuf> {
        Self::validate_key(key)?;
        let mut path = self.dir.clone();
        path.push(format!("{key}.{RECORD_EXTENSION}"));
        Ok(path)
    }

    pub fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.path_for_key(key)?;
        let mut temp = path.clone().into_os_string();
        temp.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp);

        fs::write(&temp, value)?;
        if let Err(err) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(StorageError::Io(err));
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for_key(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    pub fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for_key(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, record: &SessionRecord) -> StorageResult<()> {
        let encoded =
            serde_json::to_vec(&StoredSession::encode(record)).map_err(StorageError::Encode)?;
        self.put(SESSION_RECORD_ID, &encoded)
    }

    fn load(&self) -> StorageResult<Option<SessionRecord>> {
        let Some(bytes) = self.get(SESSION_RECORD_ID)? else {
            return Ok(None);
        };
        let path = self.path_for_key(SESSION_RECORD_ID)?;
        let stored: StoredSession =
            serde_json::from_slice(&bytes).map_err(|err| StorageError::Corrupt {
                path: path.clone(),
                message: err.to_string(),
            })?;
        let record = stored.decode(&path)?;
        if record.history.is_empty() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn clear(&self) -> StorageResult<()> {
        self.delete(SESSION_RECORD_ID)
    }
}

/// Store kept entirely in memory. Clones share the same slot, so a test can
/// keep one handle while the mirror thread owns another.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<SessionRecord>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SessionRecord) -> Self {
        let store = Self::default();
        *lock(&store.slot) = Some(record);
        store
    }

    pub fn stored(&self) -> Option<SessionRecord> {
        lock(&self.slot).clone()
    }

    /// Makes every subsequent `save`/`clear` fail with an io error.
    pub fn set_fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }

    fn check_writable(&self) -> StorageResult<()> {
        if *lock(&self.fail_writes) {
            return Err(StorageError::Io(io::Error::other("store is read-only")));
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, record: &SessionRecord) -> StorageResult<()> {
        self.check_writable()?;
        *lock(&self.slot) = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> StorageResult<Option<SessionRecord>> {
        Ok(lock(&self.slot)
            .clone()
            .filter(|record| !record.history.is_empty()))
    }

    fn clear(&self) -> StorageResult<()> {
        self.check_writable()?;
        lock(&self.slot).take();
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str) -> Snapshot {
        Snapshot::new(format!("bytes-of-{name}").into_bytes(), "image/png", name)
    }

    fn record(names: &[&str], current_index: i64) -> SessionRecord {
        let mut history = HistoryState::new();
        for name in names {
            history.append(snap(name));
        }
        let mut record = SessionRecord::from_history(&history);
        record.current_index = current_index;
        record
    }

    #[test]
    fn path_for_key_uses_json_extension_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        let path = store.path_for_key(SESSION_RECORD_ID).unwrap();
        assert_eq!(path, dir.path().join("current-session.json"));
    }

    #[test]
    fn path_for_key_rejects_traversal_and_empty_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        assert!(matches!(
            store.path_for_key("../escape"),
            Err(StorageError::InvalidKey { .. })
        ));
        assert!(matches!(
            store.path_for_key(""),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn file_store_save_load_restores_history_and_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        store.save(&record(&["A", "B", "C"], 1)).unwrap();

        let loaded = store.load().unwrap().expect("record should exist");
        assert_eq!(loaded.id, SESSION_RECORD_ID);
        assert_eq!(loaded.current_index, 1);

        let history = loaded.into_history();
        assert_eq!(history.current().unwrap().name(), "B");
        assert_eq!(history.current().unwrap().bytes(), b"bytes-of-B");
        assert!(history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn file_store_save_overwrites_prior_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        store.save(&record(&["A", "B"], 1)).unwrap();
        store.save(&record(&["X"], 0)).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.history.len(), 1);
        assert_eq!(loaded.history[0].name(), "X");
        assert!(!dir.path().join("current-session.json.tmp").exists());
    }

    #[test]
    fn file_store_clear_removes_record_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        store.save(&record(&["A"], 0)).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn file_store_reports_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        store.put(SESSION_RECORD_ID, b"{not json").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn empty_history_record_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        store.save(&record(&[], -1)).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_is_keyed_on_the_session_slot_whatever_the_record_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::with_dir(dir.path()).unwrap();
        let mut draft = record(&["A", "B"], 1);
        draft.id = "draft".to_string();
        store.save(&draft).unwrap();

        let loaded = store.load().unwrap().expect("record should be loadable");
        assert_eq!(loaded.history.len(), 2);
        assert!(!dir.path().join("draft.json").exists());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn memory_store_shares_state_between_clones() {
        let store = MemorySessionStore::new();
        let handle = store.clone();
        store.save(&record(&["A"], 0)).unwrap();
        assert_eq!(handle.stored().unwrap().history.len(), 1);

        handle.set_fail_writes(true);
        assert!(store.clear().is_err());
        assert!(store.load().unwrap().is_some());
    }
}

//! Key-value persistence for the watcher's two records.
//!
//! The store holds `knownIds` (the latest listing's identifiers),
//! `cacheRecords` (recent announcements, newest first) and `stateRevision`,
//! a counter bumped by every commit so that a stale read-modify-write is
//! rejected instead of silently overwriting a newer one.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use notice_core::{AnnouncementRecord, Commit, StoredState};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::persist::{AtomicFile, PersistError};

pub const KNOWN_IDS_KEY: &str = "knownIds";
pub const CACHE_RECORDS_KEY: &str = "cacheRecords";
pub const REVISION_KEY: &str = "stateRevision";

/// File name used by [`FileStore`] inside its directory.
pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("state document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored {key} is malformed: {message}")]
    Malformed { key: String, message: String },
    #[error("{key} changed concurrently")]
    Conflict { key: String, found: Option<Value> },
    #[error("store lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Minimal get / batch-set storage, values are JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes every entry or none of them.
    fn set(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    /// Like [`KeyValueStore::set`], but only if `guard_key` currently holds
    /// `expected` (`None` meaning absent). Otherwise fails with
    /// [`StoreError::Conflict`] carrying the value found.
    fn compare_and_set(
        &self,
        guard_key: &str,
        expected: Option<&Value>,
        entries: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        let found = self.get(guard_key)?;
        if found.as_ref() != expected {
            return Err(StoreError::Conflict {
                key: guard_key.to_string(),
                found,
            });
        }
        self.set(entries)
    }
}

fn check_guard(
    map: &Map<String, Value>,
    guard_key: &str,
    expected: Option<&Value>,
) -> Result<(), StoreError> {
    let found = map.get(guard_key);
    if found != expected {
        return Err(StoreError::Conflict {
            key: guard_key.to_string(),
            found: found.cloned(),
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let values = self.values.lock()?;
        Ok(values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock()?.get(key).cloned())
    }

    fn set(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        self.values.lock()?.extend(entries);
        Ok(())
    }

    fn compare_and_set(
        &self,
        guard_key: &str,
        expected: Option<&Value>,
        entries: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        let mut values = self.values.lock()?;
        check_guard(&values, guard_key, expected)?;
        values.extend(entries);
        Ok(())
    }
}

/// One JSON object on disk, rewritten wholesale on every batch.
#[derive(Debug)]
pub struct FileStore {
    file: AtomicFile,
    lock: Mutex<()>,
}

impl FileStore {
    /// Store in `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicFile::new(dir.into().join(STATE_FILE_NAME)),
            lock: Mutex::new(()),
        }
    }

    /// Like [`FileStore::new`], but creates `dir` now and checks that files
    /// can be created in it, so a bad location fails at startup rather than
    /// at the first commit.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let unusable = |message: String| PersistError::StateDir {
            dir: dir.clone(),
            message,
        };
        fs::create_dir_all(&dir).map_err(|err| unusable(err.to_string()))?;
        if !dir.is_dir() {
            return Err(unusable("not a directory".to_string()).into());
        }
        NamedTempFile::new_in(&dir).map_err(|err| unusable(err.to_string()))?;
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn read_document(&self) -> Result<Map<String, Value>, StoreError> {
        match self.file.read()? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(serde_json::from_slice(&bytes)?)
            }
            _ => Ok(Map::new()),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StoreError> {
        self.file.replace(&serde_json::to_vec_pretty(document)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let _guard = self.lock.lock()?;
        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let _guard = self.lock.lock()?;
        let mut document = self.read_document()?;
        document.extend(entries);
        self.write_document(&document)
    }

    fn compare_and_set(
        &self,
        guard_key: &str,
        expected: Option<&Value>,
        entries: Vec<(String, Value)>,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock()?;
        let mut document = self.read_document()?;
        check_guard(&document, guard_key, expected)?;
        document.extend(entries);
        self.write_document(&document)
    }
}

/// Typed access to the watcher's records on top of a [`KeyValueStore`].
#[derive(Clone)]
pub struct StateRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StateRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads the revision before the records. A commit landing between the
    /// reads bumps the revision past the one returned here, so the commit
    /// built from this state is rejected instead of overwriting it.
    pub fn load(&self) -> Result<StoredState, StoreError> {
        let revision = self.read(REVISION_KEY)?.unwrap_or_default();
        Ok(StoredState {
            known_ids: self.read(KNOWN_IDS_KEY)?.unwrap_or_default(),
            cache_records: self.read(CACHE_RECORDS_KEY)?.unwrap_or_default(),
            revision,
        })
    }

    pub fn cache_records(&self) -> Result<Vec<AnnouncementRecord>, StoreError> {
        Ok(self.read(CACHE_RECORDS_KEY)?.unwrap_or_default())
    }

    /// Writes both records and the next revision in one batch. Returns the
    /// new revision.
    pub fn commit(&self, commit: &Commit) -> Result<u64, StoreError> {
        let next = commit.expected_revision + 1;
        // revision 0 is never written, it stands for "no commit yet"
        let expected = (commit.expected_revision > 0).then(|| Value::from(commit.expected_revision));
        let entries = vec![
            (
                KNOWN_IDS_KEY.to_string(),
                serde_json::to_value(&commit.known_ids)?,
            ),
            (
                CACHE_RECORDS_KEY.to_string(),
                serde_json::to_value(&commit.cache_records)?,
            ),
            (REVISION_KEY.to_string(), Value::from(next)),
        ];
        self.store
            .compare_and_set(REVISION_KEY, expected.as_ref(), entries)?;
        Ok(next)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|err| StoreError::Malformed {
                    key: key.to_string(),
                    message: err.to_string(),
                }),
        }
    }
}

/// The revision a rejected commit ran into, if the store reported one.
pub fn conflicting_revision(err: &StoreError) -> Option<u64> {
    match err {
        StoreError::Conflict { found, .. } => {
            Some(found.as_ref().and_then(Value::as_u64).unwrap_or(0))
        }
        _ => None,
    }
}

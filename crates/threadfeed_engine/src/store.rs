//! Persistent ignore list.
//!
//! The store is a single RON file holding the `ignoredTopics` collection,
//! keyed by thread id, with a non-unique secondary index over the thread URL.
//! Every public operation opens its own [`StoreSession`] on the blocking pool:
//! the session takes the store gate, loads the file (creating it with the
//! current schema on first open), builds the URL index, runs the operation and
//! commits atomically if anything changed. Nothing is held between calls.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use feed_logging::{feed_debug, feed_error, feed_info};
use serde::{Deserialize, Serialize};

use crate::persist::AtomicFileWriter;

/// Schema version written to new store files.
pub const SCHEMA_VERSION: u32 = 1;
/// Name of the one collection the store holds.
pub const IGNORED_TOPICS: &str = "ignoredTopics";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreData {
    pub url: String,
    pub title: String,
}

/// Persisted record shape: `{ id, data: { url, title } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRecord {
    pub id: String,
    pub data: IgnoreData,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open ignore store {path}: {reason}")]
    OpenFailed { path: String, reason: String },
    #[error("ignore store transaction aborted: {0}")]
    TransactionAborted(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    collection: String,
    records: Vec<IgnoreRecord>,
}

impl StoreFile {
    fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            collection: IGNORED_TOPICS.to_string(),
            records: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct StoreInner {
    path: PathBuf,
    gate: Mutex<()>,
}

/// Handle to the ignore store. Cheap to clone; clones share the same gate.
#[derive(Debug, Clone)]
pub struct IgnoreStore {
    inner: Arc<StoreInner>,
}

impl IgnoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path: path.into(),
                gate: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Upsert the entry for `id`.
    pub async fn insert(&self, id: &str, data: IgnoreData) -> Result<(), StoreError> {
        let id = id.to_string();
        self.run("insert", move |session| {
            session.put(id, data);
            Ok(())
        })
        .await
    }

    /// Primary-key lookup. An absent id is `Ok(None)`.
    pub async fn get_by_key(&self, id: &str) -> Result<Option<IgnoreData>, StoreError> {
        let id = id.to_string();
        self.run("get_by_key", move |session| Ok(session.get(&id).cloned()))
            .await
    }

    /// Lookup through the URL index. When several entries share the URL the
    /// one with the lowest id wins.
    pub async fn get_by_index(&self, url: &str) -> Result<Option<IgnoreData>, StoreError> {
        let url = url.to_string();
        self.run("get_by_index", move |session| Ok(session.find(&url).cloned()))
            .await
    }

    /// Remove the entry for `id`. Returns whether an entry existed.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.run("delete", move |session| Ok(session.delete(&id)))
            .await
    }

    /// All entries ordered by id.
    pub async fn entries(&self) -> Result<Vec<IgnoreRecord>, StoreError> {
        self.run("entries", |session| {
            Ok(session
                .records
                .iter()
                .map(|(id, data)| IgnoreRecord {
                    id: id.clone(),
                    data: data.clone(),
                })
                .collect())
        })
        .await
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreSession<'_>) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = self.inner.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let mut session = StoreSession::open(&inner)?;
            let value = f(&mut session)?;
            session.commit()?;
            Ok(value)
        })
        .await
        .unwrap_or_else(|err| {
            Err(StoreError::TransactionAborted(format!(
                "{op} did not complete: {err}"
            )))
        });
        if let Err(err) = &result {
            feed_error!("ignore store {} failed: {}", op, err);
        }
        result
    }
}

/// One open/operate/close cycle. Holds the store gate for its whole lifetime,
/// so dropping it on any path releases the store.
struct StoreSession<'a> {
    path: &'a Path,
    _gate: MutexGuard<'a, ()>,
    records: BTreeMap<String, IgnoreData>,
    url_index: BTreeMap<String, BTreeSet<String>>,
    dirty: bool,
}

impl<'a> StoreSession<'a> {
    fn open(inner: &'a StoreInner) -> Result<Self, StoreError> {
        // The gate protects no data, so a poisoned lock is still usable.
        let gate = inner.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let path = inner.path.as_path();
        let file = load_or_create(path)?;
        if file.version != SCHEMA_VERSION {
            return Err(open_failed(
                path,
                format!("unsupported schema version {}", file.version),
            ));
        }
        if file.collection != IGNORED_TOPICS {
            return Err(open_failed(
                path,
                format!("unexpected collection {:?}", file.collection),
            ));
        }

        let mut session = Self {
            path,
            _gate: gate,
            records: BTreeMap::new(),
            url_index: BTreeMap::new(),
            dirty: false,
        };
        for record in file.records {
            session.index_record(record.id, record.data);
        }
        Ok(session)
    }

    fn get(&self, id: &str) -> Option<&IgnoreData> {
        self.records.get(id)
    }

    fn find(&self, url: &str) -> Option<&IgnoreData> {
        let id = self.url_index.get(url)?.iter().next()?;
        self.records.get(id)
    }

    fn put(&mut self, id: String, data: IgnoreData) {
        self.index_record(id, data);
        self.dirty = true;
    }

    fn delete(&mut self, id: &str) -> bool {
        let Some(old) = self.records.remove(id) else {
            return false;
        };
        self.unindex(&old.url, id);
        self.dirty = true;
        true
    }

    fn index_record(&mut self, id: String, data: IgnoreData) {
        if let Some(old) = self.records.get(&id) {
            let old_url = old.url.clone();
            self.unindex(&old_url, &id);
        }
        self.url_index
            .entry(data.url.clone())
            .or_default()
            .insert(id.clone());
        self.records.insert(id, data);
    }

    fn unindex(&mut self, url: &str, id: &str) {
        if let Some(ids) = self.url_index.get_mut(url) {
            ids.remove(id);
            if ids.is_empty() {
                self.url_index.remove(url);
            }
        }
    }

    fn commit(self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let file = StoreFile {
            version: SCHEMA_VERSION,
            collection: IGNORED_TOPICS.to_string(),
            records: self
                .records
                .into_iter()
                .map(|(id, data)| IgnoreRecord { id, data })
                .collect(),
        };
        write_store_file(self.path, &file).map_err(StoreError::TransactionAborted)?;
        feed_debug!("committed {} ignore entries", file.records.len());
        Ok(())
    }
}

fn load_or_create(path: &Path) -> Result<StoreFile, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => ron::from_str(&text).map_err(|err| open_failed(path, err.to_string())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let file = StoreFile::empty();
            write_store_file(path, &file).map_err(|reason| open_failed(path, reason))?;
            feed_info!("created ignore store at {:?}", path);
            Ok(file)
        }
        Err(err) => Err(open_failed(path, err.to_string())),
    }
}

fn write_store_file(path: &Path, file: &StoreFile) -> Result<(), String> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(file, pretty).map_err(|err| err.to_string())?;
    AtomicFileWriter::new(path.to_path_buf())
        .write(content.as_bytes())
        .map_err(|err| err.to_string())
}

fn open_failed(path: &Path, reason: impl Into<String>) -> StoreError {
    StoreError::OpenFailed {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

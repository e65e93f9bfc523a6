//! Durable per-conversation state.
//!
//! Each conversation owns a section pointer and a bag of string variables.
//! The engine only needs `get` and `set` on `(conversation, field)` keys, so
//! any key/value backend can sit behind [`StateStore`]. Two are provided: an
//! in-process [`MemoryStore`] and a RON-backed [`FileStore`].
//!
//! Writes are last-writer-wins. Turns for one conversation are already
//! serialized by the session lock, so the store does no locking of its own
//! beyond keeping its map consistent.
//!
//! Store calls are synchronous. [`FileStore`] rewrites its file on the
//! calling task while holding its map lock, so `set`s from all conversations
//! queue behind one disk write at a time. That suits the small, infrequent
//! writes a story makes; a backend with heavier traffic should do its I/O off
//! the runtime's worker threads.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

use log::{debug, info};
use ron::ser::PrettyConfig;

/// Which piece of a conversation's state a key addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// The section the conversation will resume from.
    Section,
    /// A script variable, named without its `$` sigil.
    Var(String),
}

impl Field {
    /// Flat name used by backends that store fields as plain strings.
    pub fn storage_name(&self) -> String {
        match self {
            Field::Section => "section".to_string(),
            Field::Var(name) => format!("var.{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub conversation: String,
    pub field: Field,
}

impl StateKey {
    pub fn section(conversation: &str) -> Self {
        Self {
            conversation: conversation.to_string(),
            field: Field::Section,
        }
    }

    pub fn var(conversation: &str, name: &str) -> Self {
        Self {
            conversation: conversation.to_string(),
            field: Field::Var(name.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("state file '{path}' is malformed: {message}")]
    Format { path: PathBuf, message: String },
}

/// Key/value surface for durable conversation state.
pub trait StateStore: Send + Sync {
    /// Read a value; `Ok(None)` when it has never been written.
    ///
    /// # Errors
    /// Backend failures only. A missing key is not an error.
    fn get(&self, key: &StateKey) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing whatever was there.
    ///
    /// # Errors
    /// Backend failures.
    fn set(&self, key: &StateKey, value: &str) -> Result<(), StoreError>;
}

/// Process-local store. State is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StateKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &StateKey) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &StateKey, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.clone(), value.to_string());
        Ok(())
    }
}

/// conversation -> field name -> value
type Records = BTreeMap<String, BTreeMap<String, String>>;

/// Store persisted to a single RON file.
///
/// The whole file is read on open and rewritten (through a temp file and a
/// rename) on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: Mutex<Records>,
}

impl FileStore {
    /// Open the state file at `path`, starting empty if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be read or parsed, or the
    /// parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            ron::from_str::<Records>(&text).map_err(|e| StoreError::Format {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            Records::new()
        };
        info!(
            "state store opened at '{}' ({} conversations)",
            path.display(),
            records.len()
        );
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn write_file(&self, records: &Records) -> Result<(), StoreError> {
        let text = ron::ser::to_string_pretty(records, PrettyConfig::default()).map_err(|e| StoreError::Format {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("ron.tmp");
        fs::write(&tmp, text).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("state written to '{}'", self.path.display());
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &StateKey) -> Result<Option<String>, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .get(&key.conversation)
            .and_then(|fields| fields.get(&key.field.storage_name()))
            .cloned())
    }

    fn set(&self, key: &StateKey, value: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = records.clone();
        updated
            .entry(key.conversation.clone())
            .or_default()
            .insert(key.field.storage_name(), value.to_string());
        // memory only changes once the file holds the new value
        self.write_file(&updated)?;
        *records = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let key = StateKey::var("chat-1", "score");
        assert_eq!(store.get(&key).unwrap(), None);

        store.set(&key, "3").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("3"));
        store.set(&key, "4").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("4"));
    }

    #[test]
    fn fields_do_not_collide_across_conversations() {
        let store = MemoryStore::new();
        store.set(&StateKey::section("a"), "Start").unwrap();
        store.set(&StateKey::var("a", "section"), "not a pointer").unwrap();

        assert_eq!(store.get(&StateKey::section("a")).unwrap().as_deref(), Some("Start"));
        assert_eq!(store.get(&StateKey::section("b")).unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.ron");

        let store = FileStore::open(&path).unwrap();
        store.set(&StateKey::section("chat-1"), "Cave").unwrap();
        store.set(&StateKey::var("chat-1", "gold"), "12").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(&StateKey::section("chat-1")).unwrap().as_deref(), Some("Cave"));
        assert_eq!(reopened.get(&StateKey::var("chat-1", "gold")).unwrap().as_deref(), Some("12"));
        assert_eq!(reopened.get(&StateKey::var("chat-2", "gold")).unwrap(), None);
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.ron");
        let store = FileStore::open(&path).unwrap();
        let key = StateKey::section("chat-1");
        store.set(&key, "Start").unwrap();

        // the temp file cannot be created while a directory sits at its path
        fs::create_dir(dir.path().join("state.ron.tmp")).unwrap();
        let err = store.set(&key, "Advanced").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("Start"));

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(&key).unwrap().as_deref(), Some("Start"));
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.ron");
        fs::write(&path, "this is not ron {").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
    }
}

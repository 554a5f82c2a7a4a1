//! Durable local storage for the three editable slots.
//!
//! The persisted snapshot is read once at startup and mirrored back on
//! every debounced change. [`FileStorage`] keeps the `html`, `css` and
//! `params` slots in one JSON document on disk; [`MemoryStorage`] backs
//! tests and ephemeral hosts.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Durable snapshot of the editable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub html: String,
    pub css: String,
    pub params: Map<String, Value>,
}

/// Key-value persistence for the editor slots.
///
/// `load` returning `Ok(None)` means nothing has been persisted yet;
/// that is the normal first-launch state, not an error.
pub trait Storage: Send + Sync {
    fn load(&self) -> Result<Option<PersistedState>>;
    fn store(&self, state: &PersistedState) -> Result<()>;
}

/// One JSON document on disk holding the three slots.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<PersistedState>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::StorageError(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    err
                )))
            }
        };
        let state = serde_json::from_str(&text).map_err(|err| {
            Error::StorageError(format!(
                "Malformed state in {}: {}",
                self.path.display(),
                err
            ))
        })?;
        Ok(Some(state))
    }

    fn store(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    Error::StorageError(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        err
                    ))
                })?;
            }
        }
        let text = serde_json::to_string_pretty(state)
            .map_err(|err| Error::StorageError(format!("Failed to serialize state: {}", err)))?;
        fs::write(&self.path, text).map_err(|err| {
            Error::StorageError(format!(
                "Failed to write {}: {}",
                self.path.display(),
                err
            ))
        })
    }
}

/// In-memory storage; clones share the same backing slot, so a test can
/// hand one copy to a pipeline and inspect the other.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Option<PersistedState>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedState>> {
        Ok(self
            .inner
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default())
    }

    fn store(&self, state: &PersistedState) -> Result<()> {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(state.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedState {
        PersistedState {
            html: "<h1>{{title}}</h1>".to_string(),
            css: "h1 { color: red }".to_string(),
            params: serde_json::from_str(r#"{"title": "Hi"}"#).unwrap(),
        }
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("editor.json"));

        assert!(storage.load().unwrap().is_none());

        let state = sample();
        storage.store(&state).unwrap();
        assert_eq!(storage.load().unwrap(), Some(state));
    }

    #[test]
    fn file_storage_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested/deeper/editor.json"));
        storage.store(&sample()).unwrap();
        assert!(storage.load().unwrap().is_some());
    }

    #[test]
    fn malformed_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::new(path);
        assert!(matches!(storage.load(), Err(Error::StorageError(_))));
    }

    #[test]
    fn memory_storage_clones_share_state() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.store(&sample()).unwrap();
        assert_eq!(other.load().unwrap(), Some(sample()));
    }
}

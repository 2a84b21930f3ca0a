use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::errors::CoreError;

/// Raw named-blob storage (browser local storage, a directory, memory).
///
/// Implementations report failures honestly; [`StorageGateway`] is the
/// layer that swallows them.
///
/// [`StorageGateway`]: super::gateway::StorageGateway
pub trait KeyValueStore {
    /// Read a blob. `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// In-memory store. Clones share the same underlying map, so a caller can
/// keep a handle and inspect what the logbook persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Rc<RefCell<HashMap<String, String>>>,
    unavailable: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing blobs.
    pub fn with_blobs<K, V>(blobs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store
            .blobs
            .borrow_mut()
            .extend(blobs.into_iter().map(|(k, v)| (k.into(), v.into())));
        store
    }

    /// Make every operation fail, like storage in a restricted browsing mode.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Direct read that bypasses the availability switch.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }

    fn check_available(&self) -> Result<(), CoreError> {
        if self.unavailable.get() {
            return Err(CoreError::StorageUnavailable("memory store disabled".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        self.check_available()?;
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.check_available()?;
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.check_available()?;
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory (native only).
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a half-written blob behind.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<std::path::PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<std::path::PathBuf, CoreError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            || key.starts_with('.')
        {
            return Err(CoreError::ValidationError(format!(
                "Invalid storage key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::StorageUnavailable(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| CoreError::StorageUnavailable(format!("{}: {e}", path.display())))
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::StorageUnavailable(format!(
                "{}: {e}",
                path.display()
            ))),
        }
    }
}

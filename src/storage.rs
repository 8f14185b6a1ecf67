//! String key-value backends for locally persisted state.
//!
//! The favorites store only needs `get_string`/`set`, so the backend is picked
//! once when the app is wired up: [`FileStore`] normally, [`MemoryStore`] in
//! tests or when the data directory is unusable.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Synchronous string store. A single `set` replaces the whole value for a key.
pub trait KeyValueStore: Send {
    fn get_string(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store; contents vanish on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk mapping keys to string values.
///
/// Every `set` rewrites the file via write-to-temp + rename so a crash never
/// leaves a half-written file behind.
///
/// ```json
/// { "favorites_v1": "{\"G5vY...\":{\"id\":\"G5vY...\",\"name\":\"...\"}}" }
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FileStore {
    /// Open (or prepare to create) the store file, creating parent directories.
    pub fn open(path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?path, "opening file store");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&contents)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Corrupt(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(map)?;
        let tmp_path = self.path.with_extension("tmp");

        tracing::trace!(tmp_path = ?tmp_path, "writing to temporary file");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Corrupt("file store lock poisoned".to_string()))?;

        Ok(self
            .read_all()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Corrupt("file store lock poisoned".to_string()))?;

        // a corrupt file is replaced rather than blocking every future write
        let mut map = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, path = ?self.path, "discarding unreadable store file");
            Map::new()
        });
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_all(&map)?;

        tracing::debug!(key, bytes = value.len(), "store value written");
        Ok(())
    }
}

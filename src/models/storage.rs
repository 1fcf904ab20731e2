use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StorageError;

/// Key holding the whole ordered snippet collection.
pub const SNIPPETS_KEY: &str = "consoleRules.snippets";
/// Key holding the selected display-language code.
pub const LANGUAGE_KEY: &str = "consoleRules.language";

const STORAGE_FILE: &str = "storage.json";

/// Persistent key-value backend.
///
/// Reads return `None` for keys never written. Writes replace the full value under the
/// key; merging happens in memory before the write.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StorageError>> + Send;

    fn set(&self, key: &str, value: Value)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, StorageError>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).set(key, value)
    }
}

/// JSON-object file on disk, one entry per key.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStorage {
    pub fn new(data_dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            path: data_dir.join(STORAGE_FILE),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StorageError::Unavailable(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }
}

impl KeyValueStore for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut map = self.read_all().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&Value::Object(map))?;

        // Write next to the target and rename so a crash never leaves half a file.
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("wrote key {key} to {}", self.path.display());
        Ok(())
    }
}

/// Process-local backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: Value) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
        self
    }

    /// Current value under `key`, read synchronously.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// The backend chosen at startup.
#[derive(Debug)]
pub enum Backend {
    File(FileStorage),
    Memory(MemoryStorage),
}

impl KeyValueStore for Backend {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self {
            Backend::File(storage) => storage.get(key).await,
            Backend::Memory(storage) => storage.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        match self {
            Backend::File(storage) => storage.set(key, value).await,
            Backend::Memory(storage) => storage.set(key, value).await,
        }
    }
}

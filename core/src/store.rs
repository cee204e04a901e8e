//! Conversation Store
//!
//! A small key-value store keyed by user email, plus the typed
//! [`ConversationCache`] that reads and writes `{"conversation_id": "..."}`
//! entries on top of it.
//!
//! Two stores ship here:
//! - [`MemoryStore`]: process-local, used by tests and `--no-persist`
//! - [`FileStore`]: one JSON object file, survives restarts

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::ConversationId;

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("store I/O failed at {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The backing file or an entry is not valid JSON
    #[error("corrupt store entry for {key}: {reason}")]
    Corrupt {
        /// Key (email) or file path
        key: String,
        /// Parser message
        reason: String,
    },
}

/// Minimal string key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// File-backed store
///
/// All entries live in a single JSON object. Writes go to a sibling temp file
/// that is then renamed over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Open (lazily) a store at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Default location: `$XDG_DATA_HOME/delphi-chat/conversations.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("delphi-chat").join("conversations.json"))
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.persist(&entries).await
    }
}

/// Serialized cache entry
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    conversation_id: ConversationId,
}

/// Typed conversation-id cache keyed by user email
///
/// Cheap to clone; clones share the same store and the same per-email
/// resolution locks.
#[derive(Clone)]
pub struct ConversationCache {
    store: Arc<dyn KeyValueStore>,
    resolving: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ConversationCache {
    /// Wrap a store
    pub fn new<S: KeyValueStore + 'static>(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Wrap a store that is also held elsewhere
    pub fn from_shared(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            resolving: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Exclusive right to resolve `email`'s conversation
    ///
    /// Hold the guard across lookup, create and [`Self::remember`]. A second
    /// resolution for the same email waits here and then finds the entry the
    /// first one wrote, so one email never gets two conversations from one
    /// cache.
    pub async fn claim(&self, email: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = Arc::clone(self.resolving.lock().entry(email.to_string()).or_default());
        lock.lock_owned().await
    }

    /// Underlying store
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Cached conversation for `email`, if any
    pub async fn lookup(&self, email: &str) -> Result<Option<ConversationId>, StoreError> {
        let Some(raw) = self.store.get(email).await? else {
            return Ok(None);
        };

        let entry: CacheEntry = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            key: email.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(entry.conversation_id))
    }

    /// Remember `conversation_id` for `email`
    pub async fn remember(
        &self,
        email: &str,
        conversation_id: &ConversationId,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_string(&CacheEntry {
            conversation_id: conversation_id.clone(),
        })
        .map_err(|e| StoreError::Corrupt {
            key: email.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(email, value).await
    }
}

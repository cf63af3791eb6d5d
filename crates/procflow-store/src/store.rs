//! The keyed store: named collections of JSON documents.
//!
//! Mutations are applied under a single writer lock (last-writer-wins for
//! `set`), optionally snapshotted to a JSON file after every write, and
//! announced on the broadcast channel by the caller. Listing preserves
//! insertion order, which doubles as creation order for the domain layer.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::broadcast::{create_broadcast_channel, BroadcastReceiver, BroadcastSender, ChangeEvent};
use crate::error::{StoreError, StoreResult};

#[derive(Clone, Serialize, Deserialize)]
struct Entry {
    key: String,
    value: Value,
}

#[derive(Default, Serialize, Deserialize)]
struct Collections {
    collections: BTreeMap<String, Vec<Entry>>,
}

/// In-process keyed store with optional JSON snapshot persistence.
pub struct Store {
    inner: RwLock<Collections>,
    tx: BroadcastSender,
    path: Option<PathBuf>,
}

impl Store {
    /// Create an empty store with no backing file.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
            tx: create_broadcast_channel(),
            path: None,
        }
    }

    /// Open a store backed by a JSON snapshot file, loading it if present.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let inner = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Collections::default()
        };
        debug!(path = %path.display(), "store opened");
        Ok(Self {
            inner: RwLock::new(inner),
            tx: create_broadcast_channel(),
            path: Some(path),
        })
    }

    /// Get a document by key. `None` when absent.
    pub fn get(&self, collection: &str, key: &str) -> StoreResult<Option<Value>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|entries| entries.iter().find(|e| e.key == key))
            .map(|e| e.value.clone()))
    }

    /// Check whether a key exists.
    pub fn contains(&self, collection: &str, key: &str) -> StoreResult<bool> {
        Ok(self.get(collection, key)?.is_some())
    }

    /// Insert a new document. Fails when the key already exists.
    pub fn insert(&self, collection: &str, key: &str, value: Value) -> StoreResult<()> {
        {
            let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
            let entries = inner.collections.entry(collection.to_string()).or_default();
            if entries.iter().any(|e| e.key == key) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    key: key.to_string(),
                });
            }
            entries.push(Entry {
                key: key.to_string(),
                value,
            });
        }
        self.persist()
    }

    /// Upsert a document, last writer wins. Keeps the original insertion
    /// position when the key already exists.
    pub fn set(&self, collection: &str, key: &str, value: Value) -> StoreResult<()> {
        {
            let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
            let entries = inner.collections.entry(collection.to_string()).or_default();
            match entries.iter_mut().find(|e| e.key == key) {
                Some(entry) => entry.value = value,
                None => entries.push(Entry {
                    key: key.to_string(),
                    value,
                }),
            }
        }
        self.persist()
    }

    /// List all documents in a collection, in insertion order.
    pub fn list(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .collections
            .get(collection)
            .map(|entries| entries.iter().map(|e| e.value.clone()).collect())
            .unwrap_or_default())
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> BroadcastReceiver {
        self.tx.subscribe()
    }

    /// Publish a change event. Best effort: having no subscribers is fine.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    /// Write the snapshot file, if this store has one. Uses a temp file and
    /// rename so readers never observe a half-written snapshot.
    fn persist(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&*inner)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

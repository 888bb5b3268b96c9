//! In-process store backed by a locked hash map

use std::collections::HashMap;
use std::sync::Arc;

use axum::async_trait;
use serde_json::Value;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::{decode, KeyValueStore, StoreError, StoreTransaction};

/// In-memory store. Values are kept as raw JSON text, like the browser
/// storage this replaces, so malformed documents are still representable.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw text under `key` without encoding it
    pub async fn insert_raw(&self, key: &str, raw: impl Into<String>) {
        self.entries.write().await.insert(key.to_string(), raw.into());
    }

    /// Raw text stored under `key`
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().await;
        entries.get(key).map(|raw| decode(key, raw)).transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let raw = value.to_string();
        self.entries.write().await.insert(key.to_string(), raw);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.entries.clone().write_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard: Some(guard),
            staged: HashMap::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Holds the store's write lock for its whole lifetime; staged writes are
/// applied on commit.
pub struct MemoryTransaction {
    guard: Option<OwnedRwLockWriteGuard<HashMap<String, String>>>,
    // None marks a pending removal
    staged: HashMap<String, Option<String>>,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.guard.is_none() {
            return Err(StoreError::TransactionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    // The whole map is already held exclusively
    async fn lock(&mut self, _keys: &[String]) -> Result<(), StoreError> {
        self.ensure_open()
    }

    async fn keys_with_prefix(&mut self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let guard = self.guard.as_ref().ok_or(StoreError::TransactionClosed)?;
        let mut keys: Vec<String> = guard
            .keys()
            .filter(|key| !matches!(self.staged.get(*key), Some(None)))
            .chain(
                self.staged
                    .iter()
                    .filter(|(key, value)| value.is_some() && !guard.contains_key(*key))
                    .map(|(key, _)| key),
            )
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn get(&mut self, key: &str) -> Result<Option<Value>, StoreError> {
        if let Some(staged) = self.staged.get(key) {
            return staged.as_deref().map(|raw| decode(key, raw)).transpose();
        }
        let guard = self.guard.as_ref().ok_or(StoreError::TransactionClosed)?;
        guard.get(key).map(|raw| decode(key, raw)).transpose()
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.staged.insert(key.to_string(), Some(value.to_string()));
        Ok(())
    }

    async fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.staged.insert(key.to_string(), None);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let mut guard = self.guard.take().ok_or(StoreError::TransactionClosed)?;
        for (key, value) in self.staged.drain() {
            match value {
                Some(raw) => {
                    guard.insert(key, raw);
                }
                None => {
                    guard.remove(&key);
                }
            }
        }
        Ok(())
    }
}

//! Key-value persistence for Bankiti
//!
//! Every collection is stored as one JSON document under a fixed key. Reads
//! outside a transaction see the last committed value; read-modify-write
//! cycles go through a [`StoreTransaction`] so concurrent writers never
//! overwrite each other's changes.

mod memory;
mod postgres;

pub use memory::{MemoryStore, MemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};

use axum::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Prefix of per-session keys (`bankiti_current_user:<jti>`)
pub const CURRENT_USER_KEY: &str = "bankiti_current_user";
/// JSON array of every registered user
pub const USERS_KEY: &str = "bankiti_users";
/// JSON array of every loan offer
pub const LOANS_KEY: &str = "bankiti_loans";
/// JSON array of every loan application
pub const APPLICATIONS_KEY: &str = "bankiti_applications";

/// Key under which the session identified by `jti` is stored
pub fn session_key(jti: &str) -> String {
    format!("{}:{}", CURRENT_USER_KEY, jti)
}

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Stored value under '{key}' is malformed: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Transaction already committed")]
    TransactionClosed,

    #[error("Key '{0}' was not locked when the transaction began")]
    NotLocked(String),

    #[error("Locking '{0}' would break the global lock order")]
    LockOrder(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Persistent JSON key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Open a transaction. Writes become visible on [`StoreTransaction::commit`]
    /// and are discarded if the transaction is dropped first.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Check the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// A read-modify-write unit over one or more keys
#[async_trait]
pub trait StoreTransaction: Send {
    /// Take exclusive locks on `keys`, in the order given, until the
    /// transaction ends. Callers must use one global order across
    /// transactions or concurrent writers can deadlock.
    async fn lock(&mut self, keys: &[String]) -> Result<(), StoreError>;

    /// Keys starting with `prefix`, sorted, as seen by this transaction
    async fn keys_with_prefix(&mut self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn get(&mut self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;
}

/// Parse a raw stored document
pub(crate) fn decode(key: &str, raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

//! Typed access to the persisted collections
//!
//! Each collection is read and written whole. Mutations go through a
//! [`UnitOfWork`], which wraps one store transaction, so the read, the change
//! and the write happen atomically.
//!
//! A unit of work locks every key it touches when it begins, in one global
//! order: users, loans, applications, then sessions by key. Two units of
//! work can therefore wait on each other but never deadlock.

mod ids;

pub use ids::IdGenerator;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::loan::{Loan, LoanApplication};
use crate::models::{Session, User};
use crate::store::{
    session_key, KeyValueStore, StoreError, StoreTransaction, APPLICATIONS_KEY,
    CURRENT_USER_KEY, LOANS_KEY, USERS_KEY,
};

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn KeyValueStore>,
    ids: Arc<IdGenerator>,
}

impl Repository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            ids: Arc::new(IdGenerator::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Fresh record id: a creation-timestamp string, unique per process
    pub fn next_id(&self) -> String {
        self.ids.next()
    }

    pub async fn users(&self) -> Result<Vec<User>, StoreError> {
        decode_collection(USERS_KEY, self.store.get(USERS_KEY).await?)
    }

    pub async fn loans(&self) -> Result<Vec<Loan>, StoreError> {
        decode_collection(LOANS_KEY, self.store.get(LOANS_KEY).await?)
    }

    pub async fn applications(&self) -> Result<Vec<LoanApplication>, StoreError> {
        decode_collection(APPLICATIONS_KEY, self.store.get(APPLICATIONS_KEY).await?)
    }

    pub async fn session(&self, jti: &str) -> Result<Option<Session>, StoreError> {
        let key = session_key(jti);
        self.store
            .get(&key)
            .await?
            .map(|value| decode_record(&key, value))
            .transpose()
    }

    /// Open a unit of work holding locks on `keys`
    pub async fn begin(&self, keys: &[&str]) -> Result<UnitOfWork, StoreError> {
        let mut uow = UnitOfWork {
            tx: self.store.begin().await?,
            locked: HashSet::new(),
            highest: None,
        };
        uow.acquire(keys.iter().map(|key| key.to_string()).collect())
            .await?;
        Ok(uow)
    }
}

/// Position of `key` in the global lock order
fn lock_order(key: &str) -> (u8, &str) {
    let rank = match key {
        USERS_KEY => 0,
        LOANS_KEY => 1,
        APPLICATIONS_KEY => 2,
        _ if key.starts_with(CURRENT_USER_KEY) => 3,
        _ => 4,
    };
    (rank, key)
}

/// One atomic read-modify-write over the collections
pub struct UnitOfWork {
    tx: Box<dyn StoreTransaction>,
    locked: HashSet<String>,
    highest: Option<String>,
}

impl UnitOfWork {
    /// Lock more keys. They must all sort after every key already held.
    async fn acquire(&mut self, keys: Vec<String>) -> Result<(), StoreError> {
        let mut fresh: Vec<String> = keys
            .into_iter()
            .filter(|key| !self.locked.contains(key))
            .collect();
        fresh.sort_by(|a, b| lock_order(a).cmp(&lock_order(b)));
        fresh.dedup();

        if let (Some(first), Some(highest)) = (fresh.first(), self.highest.as_deref()) {
            if lock_order(first) < lock_order(highest) {
                return Err(StoreError::LockOrder(first.clone()));
            }
        }

        self.tx.lock(&fresh).await?;
        if let Some(last) = fresh.last() {
            self.highest = Some(last.clone());
        }
        self.locked.extend(fresh);
        Ok(())
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if self.locked.contains(key) {
            Ok(())
        } else {
            Err(StoreError::NotLocked(key.to_string()))
        }
    }

    async fn get(&mut self, key: &str) -> Result<Option<Value>, StoreError> {
        self.check(key)?;
        self.tx.get(key).await
    }

    pub async fn users(&mut self) -> Result<Vec<User>, StoreError> {
        let value = self.get(USERS_KEY).await?;
        decode_collection(USERS_KEY, value)
    }

    pub async fn loans(&mut self) -> Result<Vec<Loan>, StoreError> {
        let value = self.get(LOANS_KEY).await?;
        decode_collection(LOANS_KEY, value)
    }

    pub async fn applications(&mut self) -> Result<Vec<LoanApplication>, StoreError> {
        let value = self.get(APPLICATIONS_KEY).await?;
        decode_collection(APPLICATIONS_KEY, value)
    }

    pub async fn session(&mut self, jti: &str) -> Result<Option<Session>, StoreError> {
        let key = session_key(jti);
        self.get(&key)
            .await?
            .map(|value| decode_record(&key, value))
            .transpose()
    }

    /// Lock and load every session belonging to `user_id`.
    ///
    /// Requires the users lock: sign-in and sign-out take it too, so the set
    /// of sessions cannot change while this unit of work is open.
    pub async fn sessions_of(&mut self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        self.check(USERS_KEY)?;

        let prefix = session_key("");
        let keys = self.tx.keys_with_prefix(&prefix).await?;
        self.acquire(keys.clone()).await?;

        let mut sessions = Vec::new();
        for key in keys {
            if let Some(value) = self.tx.get(&key).await? {
                let session: Session = decode_record(&key, value)?;
                if session.user.id == user_id {
                    sessions.push(session);
                }
            }
        }
        Ok(sessions)
    }

    pub async fn put_users(&mut self, users: &[User]) -> Result<(), StoreError> {
        self.put(USERS_KEY, users).await
    }

    pub async fn put_loans(&mut self, loans: &[Loan]) -> Result<(), StoreError> {
        self.put(LOANS_KEY, loans).await
    }

    pub async fn put_applications(
        &mut self,
        applications: &[LoanApplication],
    ) -> Result<(), StoreError> {
        self.put(APPLICATIONS_KEY, applications).await
    }

    pub async fn put_session(&mut self, session: &Session) -> Result<(), StoreError> {
        self.put(&session_key(&session.jti), session).await
    }

    pub async fn remove_session(&mut self, jti: &str) -> Result<(), StoreError> {
        let key = session_key(jti);
        self.check(&key)?;
        self.tx.remove(&key).await
    }

    pub async fn commit(mut self) -> Result<(), StoreError> {
        self.tx.commit().await
    }

    async fn put<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        self.check(key)?;
        let value = serde_json::to_value(value).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.tx.set(key, value).await
    }
}

/// Absent collections read as empty
fn decode_collection<T: DeserializeOwned>(
    key: &str,
    value: Option<Value>,
) -> Result<Vec<T>, StoreError> {
    match value {
        Some(value) => decode_record(key, value),
        None => Ok(Vec::new()),
    }
}

fn decode_record<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

//! PostgreSQL-backed store
//!
//! Documents live in `kv_entries`. Transactions take a transaction-scoped
//! advisory lock per key before reading it, so two writers of the same
//! collection queue up instead of losing an update.

use std::collections::HashSet;

use axum::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use super::{decode, KeyValueStore, StoreError, StoreTransaction};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for PostgresStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_entries WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        raw.map(|raw| decode(key, &raw)).transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        upsert(&self.pool, key, &value.to_string()).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction {
            tx: Some(tx),
            locked: HashSet::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let present: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = 'kv_entries'",
        )
        .fetch_one(&self.pool)
        .await?;
        if present == 0 {
            return Err(StoreError::Backend(
                "kv_entries table is missing; migrations have not run".to_string(),
            ));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

async fn upsert<'e, E>(executor: E, key: &str, raw: &str) -> Result<(), StoreError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO kv_entries (key, value, updated_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
        "#,
    )
    .bind(key)
    .bind(raw)
    .execute(executor)
    .await?;
    Ok(())
}

pub struct PostgresTransaction {
    tx: Option<Transaction<'static, Postgres>>,
    locked: HashSet<String>,
}

impl PostgresTransaction {
    fn conn(&mut self) -> Result<&mut Transaction<'static, Postgres>, StoreError> {
        self.tx.as_mut().ok_or(StoreError::TransactionClosed)
    }

    /// Serialise writers of `key` until this transaction ends
    async fn lock_key(&mut self, key: &str) -> Result<(), StoreError> {
        if self.locked.contains(key) {
            return Ok(());
        }
        let tx = self.conn()?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(key)
            .execute(&mut **tx)
            .await?;
        self.locked.insert(key.to_string());
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn lock(&mut self, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            self.lock_key(key).await?;
        }
        Ok(())
    }

    async fn keys_with_prefix(&mut self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let tx = self.conn()?;
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT key FROM kv_entries WHERE substr(key, 1, length($1)) = $1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&mut **tx)
        .await?;
        Ok(keys)
    }

    async fn get(&mut self, key: &str) -> Result<Option<Value>, StoreError> {
        self.lock_key(key).await?;
        let tx = self.conn()?;
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_entries WHERE key = $1")
                .bind(key)
                .fetch_optional(&mut **tx)
                .await?;
        raw.map(|raw| decode(key, &raw)).transpose()
    }

    async fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock_key(key).await?;
        let tx = self.conn()?;
        upsert(&mut **tx, key, &value.to_string()).await
    }

    async fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.lock_key(key).await?;
        let tx = self.conn()?;
        sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .bind(key)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }
}

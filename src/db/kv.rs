//! String key-value persistence for profile settings.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::schedule::lock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable string storage keyed by name.
#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read `key`, `None` when never written.
    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Store backed by the `kv_store` table.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Create a store on a pool returned by [`crate::db::init_db`].
    pub fn new(pool: SqlitePool) -> Self {
        SqliteKeyValueStore { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at_ms = excluded.updated_at_ms
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use tempfile::TempDir;

    async fn sqlite_store(dir: &TempDir) -> SqliteKeyValueStore {
        let db_path = dir.path().join("kv.db").to_string_lossy().to_string();
        SqliteKeyValueStore::new(init_db(&db_path).await.expect("init_db failed"))
    }

    #[tokio::test]
    async fn test_sqlite_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = sqlite_store(&dir).await;
        assert_eq!(store.get_string("game_profile_clan").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_set_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = sqlite_store(&dir).await;
        store.set_string("game_profile_clan", "Lobos").await.unwrap();
        store.set_string("game_profile_clan", "Corujas").await.unwrap();
        assert_eq!(
            store.get_string("game_profile_clan").await.unwrap(),
            Some("Corujas".to_string())
        );
    }

    #[tokio::test]
    async fn test_sqlite_value_survives_reopen() {
        let dir = TempDir::new().unwrap();
        sqlite_store(&dir)
            .await
            .set_string("k", "v")
            .await
            .unwrap();
        let reopened = sqlite_store(&dir).await;
        assert_eq!(reopened.get_string("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get_string("k").await.unwrap(), None);
        store.set_string("k", "v").await.unwrap();
        assert_eq!(store.get_string("k").await.unwrap(), Some("v".to_string()));
    }
}

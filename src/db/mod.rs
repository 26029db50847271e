pub mod repository;

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::AppError;

pub use repository::SqliteStorage;

/// Key of the logged-in user.
pub const SESSION_KEY: &str = "tpq_session";
/// Key of the remote blob id this device syncs against.
pub const SYNC_ID_KEY: &str = "tpq_sync_id";

/// Durable string storage, one JSON document per key.
#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn save(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;

    /// Writes several keys as one unit. Implementations that can do so
    /// atomically should override this.
    async fn save_many(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        for (key, value) in entries {
            self.save(key, value).await?;
        }
        Ok(())
    }
}

/// Process-local storage for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let storage = Self::new();
        {
            let mut map = storage.entries.write().await;
            for (k, v) in entries {
                map.insert(k.into(), v.into());
            }
        }
        storage
    }
}

#[async_trait]
impl StoragePort for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

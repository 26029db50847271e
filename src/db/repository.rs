use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::StoragePort;
use crate::error::AppError;

/// `StoragePort` over the `kv_store` table.
#[derive(Clone)]
pub struct SqliteStorage {
    db: SqlitePool,
}

impl SqliteStorage {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .map_err(|e| AppError::Database(e.into()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

const UPSERT: &str = r#"
    INSERT INTO kv_store (key, value, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

#[async_trait]
impl StoragePort for SqliteStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn save_many(&self, entries: &[(&str, String)]) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.db.begin().await?;
        for (key, value) in entries {
            sqlx::query(UPSERT)
                .bind(*key)
                .bind(value)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> SqliteStorage {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        let storage = SqliteStorage::new(pool);
        storage.migrate().await.expect("Failed to run migrations");
        storage
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let storage = setup_test_db().await;

        assert_eq!(storage.load("tpq_students").await.unwrap(), None);
        storage.save("tpq_students", "[]").await.unwrap();
        assert_eq!(
            storage.load("tpq_students").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_key() {
        let storage = setup_test_db().await;

        storage.save("tpq_sync_id", "first").await.unwrap();
        storage.save("tpq_sync_id", "second").await.unwrap();
        assert_eq!(
            storage.load("tpq_sync_id").await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_save_many_and_remove() {
        let storage = setup_test_db().await;

        storage
            .save_many(&[
                ("tpq_attendance", "[]".to_string()),
                ("tpq_payments", "[]".to_string()),
            ])
            .await
            .unwrap();
        assert!(storage.load("tpq_payments").await.unwrap().is_some());

        storage.remove("tpq_payments").await.unwrap();
        assert_eq!(storage.load("tpq_payments").await.unwrap(), None);
        assert!(storage.load("tpq_attendance").await.unwrap().is_some());
    }
}

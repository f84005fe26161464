//! SQLite-backed [`LocalStore`].

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{prepend_json, LocalStore};
use crate::errors::AppError;

/// Database repository for all key-value operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocalStore for Repository {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append(&self, key: &str, item: serde_json::Value) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?
            .map(|row| row.get("value"));

        let updated = prepend_json(key, existing.as_deref(), item)?;

        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&updated)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_set_roundtrip_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("store.sqlite");

        {
            let repo = Repository::new(init_database(&db_path).await.unwrap());
            assert_eq!(repo.get("missing").await.unwrap(), None);
            repo.set("k", "one").await.unwrap();
            repo.set("k", "two").await.unwrap();
            repo.append("list", json!({"n": 1})).await.unwrap();
            repo.append("list", json!({"n": 2})).await.unwrap();
        }

        let repo = Repository::new(init_database(&db_path).await.unwrap());
        assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("two"));
        assert_eq!(
            repo.get("list").await.unwrap().as_deref(),
            Some(r#"[{"n":2},{"n":1}]"#)
        );
    }
}

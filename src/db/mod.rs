//! Local persistence for the desk: order counter, history, cached logo and documents.
//!
//! Everything is a key-value pair behind [`LocalStore`], so callers never see how
//! it is stored. SQLite is the production backend.

#[cfg(test)]
mod memory;
mod repository;

#[cfg(test)]
pub use memory::*;
pub use repository::*;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::errors::AppError;

/// Key-value store injected into the sequence generator, history and orchestrator.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Put `item` at the front of the JSON array stored under `key`.
    ///
    /// A missing key starts a new array. A value that is not a JSON array is
    /// replaced.
    async fn append(&self, key: &str, item: serde_json::Value) -> Result<(), AppError>;
}

/// Prepend `item` to a stored JSON array, tolerating a missing or unreadable value.
pub(crate) fn prepend_json(
    key: &str,
    existing: Option<&str>,
    item: serde_json::Value,
) -> Result<String, AppError> {
    let mut items = match existing {
        None => Vec::new(),
        Some(raw) => match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Replacing unreadable list at {}: {}", key, e);
                Vec::new()
            }
        },
    };
    items.insert(0, item);
    Ok(serde_json::to_string(&items)?)
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

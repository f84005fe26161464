//! History of submitted orders, newest first.
//!
//! The list grows without bound; nothing is ever evicted.

use crate::db::LocalStore;
use crate::errors::AppError;
use crate::models::HistoryEntry;

/// Store key of the history list.
pub const HISTORY_KEY: &str = "lfp_history";

/// Record a submitted order at the front of the history.
pub async fn record(store: &dyn LocalStore, entry: &HistoryEntry) -> Result<(), AppError> {
    store.append(HISTORY_KEY, serde_json::to_value(entry)?).await
}

/// Load the full history, newest first.
pub async fn list(store: &dyn LocalStore) -> Result<Vec<HistoryEntry>, AppError> {
    match store.get(HISTORY_KEY).await? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            AppError::Database(format!("History list is unreadable: {}", e))
        }),
        None => Ok(Vec::new()),
    }
}

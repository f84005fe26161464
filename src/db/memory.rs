//! In-memory [`LocalStore`] used by tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{prepend_json, LocalStore};
use crate::errors::AppError;

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.values
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn append(&self, key: &str, item: serde_json::Value) -> Result<(), AppError> {
        let mut values = self.lock()?;
        let updated = prepend_json(key, values.get(key).map(String::as_str), item)?;
        values.insert(key.to_string(), updated);
        Ok(())
    }
}

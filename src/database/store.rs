use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::Result;

/// Persistent mapping of setting name to value.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a value, `None` when the key was never set.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Write `default` only when the key is absent.
    async fn ensure(&self, key: &str, default: Value) -> Result<()>;
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn ensure(&self, key: &str, default: Value) -> Result<()> {
        self.values
            .write()
            .await
            .entry(key.to_string())
            .or_insert(default);
        Ok(())
    }
}

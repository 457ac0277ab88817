pub mod file_store;
pub mod redis_store;
pub mod settings;
pub mod store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    errors::{RelayError, Result},
};
use file_store::JsonFileStore;
use redis_store::RedisStore;
use store::{ConfigStore, MemoryStore};

/// Where settings are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    #[default]
    File,
    Redis,
    Memory,
}

/// Open the store selected in the configuration.
pub async fn open_store(config: &Config) -> Result<Arc<dyn ConfigStore>> {
    let store: Arc<dyn ConfigStore> = match config.store {
        StoreType::File => Arc::new(JsonFileStore::open(config.store_path()).await?),
        StoreType::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| RelayError::config("Missing redis URL"))?;
            Arc::new(RedisStore::connect(url, &config.credentials.channel).await?)
        }
        StoreType::Memory => Arc::new(MemoryStore::new()),
    };

    Ok(store)
}

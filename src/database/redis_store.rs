use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use serde_json::Value;
use tracing::warn;

use super::store::ConfigStore;
use crate::errors::{constants::REDIS_KEY_PREFIX, Result};

/// Settings kept in Redis as JSON strings, one key per setting, namespaced
/// by channel so several bots can share a server.
///
/// One multiplexed connection is opened up front and cloned per call.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
    namespace: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl RedisStore {
    /// Open a connection to `url` and check that the server answers.
    #[tracing::instrument(skip(url))]
    pub async fn connect(url: &str, channel: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let mut connection = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<()>(&mut connection).await?;

        Ok(Self {
            connection,
            namespace: namespace_for(channel),
        })
    }

    fn setting_key(&self, key: &str) -> String {
        setting_key(&self.namespace, key)
    }
}

fn namespace_for(channel: &str) -> String {
    channel.trim_start_matches('#').to_lowercase()
}

fn setting_key(namespace: &str, key: &str) -> String {
    format!("{}{}:{}", REDIS_KEY_PREFIX, namespace, key)
}

/// A value that is not valid JSON reads as unset so the setting's default applies.
fn decode_value(key: &str, raw: Option<String>) -> Option<Value> {
    let raw = raw.filter(|raw| !raw.is_empty())?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unreadable stored value");
            None
        }
    }
}

#[async_trait]
impl ConfigStore for RedisStore {
    #[tracing::instrument]
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(self.setting_key(key)).await?;

        Ok(decode_value(key, raw))
    }

    #[tracing::instrument]
    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut connection = self.connection.clone();
        connection
            .set::<_, _, ()>(self.setting_key(key), serde_json::to_string(&value)?)
            .await?;
        Ok(())
    }

    #[tracing::instrument]
    async fn ensure(&self, key: &str, default: Value) -> Result<()> {
        let mut connection = self.connection.clone();
        connection
            .set_nx::<_, _, bool>(self.setting_key(key), serde_json::to_string(&default)?)
            .await?;
        Ok(())
    }
}

use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use super::{normalize_ttl, PriceCache};
use crate::errors::CoreError;

/// Redis-backed cache shared by every engine instance.
///
/// Wraps a [`ConnectionManager`], which reconnects on its own and is cheap
/// to clone per command.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, CoreError> {
        let client = ::redis::Client::open(url)
            .map_err(|e| CoreError::Config(format!("invalid redis url: {e}")))?;
        let manager = ConnectionManager::new(client).await?;
        info!("connected to redis price cache");
        Ok(Self { manager })
    }

    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl PriceCache for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        let mut conn = self.manager.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CoreError> {
        let mut conn = self.manager.clone();
        let seconds = normalize_ttl(ttl).as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds).await?;
        Ok(())
    }
}

//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheStore, StoreError};

/// Shared cache store over a multiplexed, auto-reconnecting connection.
pub struct RedisStore {
    connection: RwLock<Option<ConnectionManager>>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let connection = ConnectionManager::new(client).await.map_err(store_error)?;
        info!(target = "cinema::infra::redis", "connected to redis");
        Ok(Self {
            connection: RwLock::new(Some(connection)),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        self.connection
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(StoreError::Closed)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let mut connection = self.connection().await?;
        let value: Option<Vec<u8>> = connection.get(key).await.map_err(store_error)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let mut connection = self.connection().await?;
        let seconds = ttl.as_secs().max(1);
        let _: () = connection
            .set_ex(key, value.as_ref(), seconds)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    /// Drop the shared connection; later calls fail with [`StoreError::Closed`].
    async fn close(&self) -> Result<(), StoreError> {
        self.connection.write().await.take();
        Ok(())
    }
}

fn store_error(error: redis::RedisError) -> StoreError {
    StoreError::unavailable(error.to_string())
}

use crate::cache::{CacheError, CacheStore};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time;

/// Redis-backed cache store.
///
/// The connection is established once. If that fails the store stays
/// disconnected for its whole lifetime and never retries.
pub struct RedisStore {
    connection: RwLock<Option<MultiplexedConnection>>,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, timeout: Duration) -> Self {
        let connection = match Self::open(redis_url, timeout).await {
            Ok(conn) => {
                tracing::info!("Redis connected successfully");
                Some(conn)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to Redis, caching disabled");
                None
            }
        };

        Self {
            connection: RwLock::new(connection),
        }
    }

    /// A store that never connected, every read misses.
    pub fn disconnected() -> Self {
        Self {
            connection: RwLock::new(None),
        }
    }

    async fn open(redis_url: &str, timeout: Duration) -> Result<MultiplexedConnection, CacheError> {
        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Store(format!("Failed to create Redis client: {}", e)))?;

        let conn = time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CacheError::Store("Timed out connecting to Redis".to_string()))??;

        Ok(conn)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or(CacheError::Disconnected)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl.as_secs().max(1))
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        redis::cmd("DEL").arg(key).query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    async fn close(&self) {
        if self.connection.write().await.take().is_some() {
            tracing::info!("Redis connection closed");
        }
    }
}

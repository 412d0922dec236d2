//! Best-effort key-value cache.
//!
//! `Cache` never fails a caller: store errors and (de)serialization errors are
//! logged and turned into a miss (reads) or a no-op (writes).

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache store is not connected")]
    Disconnected,

    #[error("Cache store error: {0}")]
    Store(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Store(err.to_string())
    }
}

/// Raw string store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn is_connected(&self) -> bool;

    /// Releases the underlying connection; later calls behave as disconnected.
    async fn close(&self);
}

#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(CacheError::Disconnected) => return None,
            Err(e) => {
                warn!(key, error = %e, "Cache get failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.ttl).await
    }

    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Cache value could not be serialized");
                return;
            }
        };

        match self.store.set(key, &raw, ttl).await {
            Ok(()) | Err(CacheError::Disconnected) => {}
            Err(e) => warn!(key, error = %e, "Cache set failed"),
        }
    }

    pub async fn delete(&self, key: &str) {
        match self.store.delete(key).await {
            Ok(()) | Err(CacheError::Disconnected) => {}
            Err(e) => warn!(key, error = %e, "Cache delete failed"),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.store.is_connected().await
    }

    pub async fn close(&self) {
        self.store.close().await
    }
}

/// In-memory store, for tests and for running without Redis.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|(_, expires)| *expires > now).count())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Store("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => return Ok(Some(value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.lock()?
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

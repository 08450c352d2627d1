use crate::store::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    payload: Vec<u8>,
    created_at: Instant,
}

/// In-memory cache implementation using HashMap and Mutex. Used by tests
/// and cache-less runs; nothing survives the process.
pub struct MemoryCache {
    inner: Arc<Mutex<HashMap<String, CacheValue>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str, ttl: Duration) -> Option<Vec<u8>> {
        let cache = self.inner.lock().await;
        if let Some(entry) = cache.get(key) {
            if entry.created_at.elapsed() >= ttl {
                debug!("Cache entry expired for key: {key}");
                return None;
            }
            debug!("Cache HIT for key: {key}");
            return Some(entry.payload.clone());
        }
        debug!("Cache MISS for key: {key}");
        None
    }

    async fn put(&self, key: &str, payload: &[u8]) {
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {key}");
        cache.insert(
            key.to_string(),
            CacheValue {
                payload: payload.to_vec(),
                created_at: Instant::now(),
            },
        );
    }

    async fn clear(&self) -> usize {
        let mut cache = self.inner.lock().await;
        let removed = cache.len();
        cache.clear();
        debug!("Cache CLEAR removed {removed} entries");
        removed
    }
}

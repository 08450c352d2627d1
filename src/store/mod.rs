pub mod disk;
pub mod memory;

use async_trait::async_trait;
use std::time::Duration;

pub use disk::DiskCache;
pub use memory::MemoryCache;

/// Durable (key, payload, created-at) storage behind the fetch layer.
///
/// Freshness is judged per read against the caller-supplied TTL for the
/// key's operation class, so one store serves every TTL class at once. A
/// stale entry is reported as a miss and overwritten by the next
/// successful fetch rather than deleted eagerly.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str, ttl: Duration) -> Option<Vec<u8>>;
    async fn put(&self, key: &str, payload: &[u8]);
    /// Removes every entry and returns how many were purged.
    async fn clear(&self) -> usize;
}

use crate::store::CacheStore;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Persistent cache on an fjall partition. Entries survive process
/// restarts, so still-fresh responses are reused across runs.
pub struct DiskCache {
    partition: PartitionHandle,
    _keyspace: Keyspace,
}

impl DiskCache {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition("fetch", PartitionCreateOptions::default())?;
        Ok(Self {
            partition,
            _keyspace: keyspace,
        })
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// Entry layout: 8-byte big-endian creation time in millis, then the payload.
fn encode_entry(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + payload.len());
    buf.extend_from_slice(&now_millis().to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

fn decode_entry(raw: &[u8], ttl: Duration) -> Option<Vec<u8>> {
    let (stamp, payload) = raw.split_at_checked(8)?;
    let created = u64::from_be_bytes(stamp.try_into().ok()?);
    let age = now_millis().saturating_sub(created);
    if u128::from(age) >= ttl.as_millis() {
        return None;
    }
    Some(payload.to_vec())
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn get(&self, key: &str, ttl: Duration) -> Option<Vec<u8>> {
        match self.partition.get(key.as_bytes()) {
            Ok(Some(raw)) => {
                let payload = decode_entry(&raw, ttl);
                if payload.is_some() {
                    debug!("Cache HIT for key: {key}");
                } else {
                    debug!("Cache entry expired for key: {key}");
                }
                payload
            }
            Ok(None) => {
                debug!("Cache MISS for key: {key}");
                None
            }
            Err(e) => {
                debug!("DiskCache get error: {e}");
                None
            }
        }
    }

    async fn put(&self, key: &str, payload: &[u8]) {
        if let Err(e) = self.partition.insert(key.as_bytes(), encode_entry(payload)) {
            debug!("DiskCache put error: {e}");
        } else {
            debug!("Cache PUT for key: {key}");
        }
    }

    async fn clear(&self) -> usize {
        let keys: Vec<_> = self
            .partition
            .iter()
            .filter_map(|kv| kv.ok().map(|(key, _)| key))
            .collect();
        let mut removed = 0;
        for key in keys {
            match self.partition.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => debug!("DiskCache remove error: {e}"),
            }
        }
        debug!("Cache CLEAR removed {removed} entries");
        removed
    }
}

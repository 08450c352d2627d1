//! Resilient fetch layer: cache-first lookups, bounded transport retries,
//! rate-limit cooldowns and call spacing for the upstream disclosure API.

use crate::core::config::ApiConfig;
use crate::store::CacheStore;
use anyhow::{Result, anyhow};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Derives the cache key for one logical call. Parameters are sorted by
/// name so keyword-style argument order never changes the key, and every
/// field is length-delimited so distinct parameter sets cannot collide.
pub fn cache_key(operation: &str, params: &[(&str, String)]) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update((operation.len() as u64).to_be_bytes());
    hasher.update(operation.as_bytes());
    for (name, value) in sorted {
        hasher.update((name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value.as_bytes());
    }
    format!("{operation}_{:x}", hasher.finalize())
}

/// Enforces a minimum spacing between consecutive outbound calls.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// HTTP client for the disclosure API. Every call goes through the cache
/// first; misses are fetched with a bounded retry budget and written back
/// on success. The credential rides on every request but stays out of the
/// cache key, so rotating it keeps fresh entries valid.
pub struct FetchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: Arc<dyn CacheStore>,
    limiter: RateLimiter,
    retry_count: u32,
    retry_delay: Duration,
    rate_limit_cooldown: Duration,
}

impl FetchClient {
    pub fn new(config: &ApiConfig, api_key: &str, cache: Arc<dyn CacheStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("dartx/0.1")
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cache,
            limiter: RateLimiter::new(config.min_call_interval()),
            retry_count: config.retry_count,
            retry_delay: config.retry_delay(),
            rate_limit_cooldown: config.rate_limit_cooldown(),
        })
    }

    /// Fetches one operation. A 2xx body (including "no data" business
    /// payloads) is cached and returned; rate-limit responses cool down
    /// without consuming the attempt budget; everything else is retried
    /// with backoff until the budget runs out. A failed call never writes
    /// to the cache.
    pub async fn fetch(
        &self,
        operation: &str,
        path: &str,
        params: &[(&str, String)],
        ttl: Duration,
    ) -> Result<Vec<u8>> {
        let key = cache_key(operation, params);
        if let Some(payload) = self.cache.get(&key, ttl).await {
            debug!("Using cached response for {operation}");
            return Ok(payload);
        }

        let url = format!("{}/{}", self.base_url, path);
        let mut attempt = 1u32;
        while attempt <= self.retry_count {
            self.limiter.wait().await;
            debug!(
                "Requesting {url} (attempt {attempt}/{})",
                self.retry_count
            );

            let request = self
                .http
                .get(&url)
                .query(&[("crtfc_key", self.api_key.as_str())])
                .query(params);

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    match response.bytes().await {
                        Ok(body) => {
                            self.cache.put(&key, &body).await;
                            return Ok(body.to_vec());
                        }
                        Err(e) => warn!("Failed to read response body on attempt {attempt}: {e}"),
                    }
                }
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    warn!(
                        "Rate limit hit, waiting {}s",
                        self.rate_limit_cooldown.as_secs()
                    );
                    tokio::time::sleep(self.rate_limit_cooldown).await;
                    // Rate-limit waits do not count against the attempt budget
                    continue;
                }
                Ok(response) => {
                    warn!("API error {} for {operation}", response.status());
                }
                Err(e) if e.is_timeout() => {
                    warn!("Timeout on attempt {attempt}");
                }
                Err(e) => {
                    warn!("Request error on attempt {attempt}: {e}");
                }
            }

            if attempt < self.retry_count {
                tokio::time::sleep(self.retry_delay * attempt).await;
            }
            attempt += 1;
        }

        Err(anyhow!(
            "{operation} failed after {} attempts",
            self.retry_count
        ))
    }
}

//! TTL-keyed memoization for expensive aggregate queries.
//!
//! An explicit cache service instance, injected into the loop's tool layer
//! and parameterized by an injectable clock so TTL behavior is deterministic
//! under test. Entries are evicted lazily on read; no background sweep is
//! required for correctness.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::trace;

use crate::domain::errors::EngineResult;
use crate::domain::ports::Clock;

struct CacheEntry {
    value: serde_json::Value,
    expires_at: DateTime<Utc>,
}

/// Deterministic cache key from a tool name and its normalized arguments.
///
/// `serde_json` serializes object keys in sorted order, so semantically
/// identical argument objects produce identical keys.
pub fn cache_key(tool: &str, arguments: &serde_json::Value) -> String {
    format!("{tool}:{arguments}")
}

/// TTL cache shared by all tools the investigation loop may invoke.
///
/// Concurrent sibling tool calls may read and write simultaneously;
/// last-writer-wins on identical keys is acceptable since computations are
/// deterministic for a given key.
pub struct QueryCache {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if fresh, otherwise run `compute`,
    /// store its result with a fresh expiry, and return it.
    ///
    /// A zero TTL bypasses the cache entirely. A failed computation is never
    /// memoized: the failure propagates uncached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> EngineResult<serde_json::Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineResult<serde_json::Value>>,
    {
        if ttl.is_zero() {
            return compute().await;
        }

        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if entry.expires_at > now {
                    trace!(key, "cache hit");
                    return Ok(entry.value.clone());
                }
            }
        }

        // Expired entries are treated as absent and dropped on this miss.
        {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.get(key) {
                if entry.expires_at > now {
                    return Ok(entry.value.clone());
                }
                entries.remove(key);
            }
        }

        trace!(key, "cache miss, computing");
        let value = compute().await?;

        let expires_at = now
            + ChronoDuration::from_std(ttl)
                .unwrap_or_else(|_| ChronoDuration::seconds(i64::MAX / 1_000));
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(value)
    }

    /// Number of live (possibly stale) entries, for diagnostics.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

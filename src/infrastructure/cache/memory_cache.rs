//! In-process cache implementation.

use super::service::{CacheResult, CachedLink, LinkCache};
use crate::domain::entities::Link;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Entry with its eviction deadline.
struct MemoryEntry {
    cached: CachedLink,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

struct Entries {
    map: HashMap<String, MemoryEntry>,
    next_purge: Instant,
}

/// A process-local cache for deployments without Redis and for tests that
/// need real hit/miss behavior.
///
/// Entries carry the same fixed TTL semantics as [`super::RedisCache`]:
/// every `put` resets the deadline, and an expired entry reads as a miss.
/// Expired entries are dropped on access, and writes run a full purge once
/// per TTL so that aliases cached once and never read again cannot
/// accumulate: the map never holds more than two TTLs worth of writes.
pub struct MemoryCache {
    entries: RwLock<Entries>,
    ttl: Duration,
}

impl MemoryCache {
    /// Creates an empty cache with a fixed per-entry TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(Entries {
                map: HashMap::new(),
                next_purge: Instant::now() + ttl,
            }),
            ttl,
        }
    }

    /// Number of entries currently held, including not-yet-collected
    /// expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.map.is_empty()
    }
}

#[async_trait]
impl LinkCache for MemoryCache {
    async fn put(&self, link: &Link) -> CacheResult<()> {
        let now = Instant::now();
        let entry = MemoryEntry {
            cached: CachedLink::from(link),
            expires_at: now + self.ttl,
        };

        let mut entries = self.entries.write().await;
        if now >= entries.next_purge {
            entries.map.retain(|_, e| !e.is_expired(now));
            entries.next_purge = now + self.ttl;
        }
        entries.map.insert(link.alias.clone(), entry);
        debug!("Cache SET: {} (TTL: {:?})", link.alias, self.ttl);
        Ok(())
    }

    async fn get(&self, alias: &str) -> CacheResult<Option<CachedLink>> {
        let now = Instant::now();

        {
            let entries = self.entries.read().await;
            match entries.map.get(alias) {
                Some(entry) if !entry.is_expired(now) => {
                    debug!("Cache HIT: {}", alias);
                    return Ok(Some(entry.cached.clone()));
                }
                Some(_) => {}
                None => {
                    debug!("Cache MISS: {}", alias);
                    return Ok(None);
                }
            }
        }

        // Expired: drop it under the write lock, re-checking the deadline
        // in case a concurrent put refreshed the entry.
        let mut entries = self.entries.write().await;
        if entries.map.get(alias).is_some_and(|e| e.is_expired(now)) {
            entries.map.remove(alias);
        }
        debug!("Cache MISS (expired): {}", alias);
        Ok(None)
    }

    async fn invalidate(&self, alias: &str) -> CacheResult<()> {
        if self.entries.write().await.map.remove(alias).is_some() {
            debug!("Cache INVALIDATE: {}", alias);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

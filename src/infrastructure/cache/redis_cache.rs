//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CachedLink, LinkCache};
use crate::domain::entities::Link;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Redis cache implementation for fast alias lookups.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection
/// reuse. All operations are fail-open: errors are logged but don't
/// propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    ttl: Duration,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and fixes
    /// the per-entry TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, ttl: Duration) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        let _: () = redis::cmd("PING")
            .query_async(&mut test_conn)
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            ttl,
            key_prefix: "link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, alias: &str) -> String {
        format!("{}{}", self.key_prefix, alias)
    }
}

#[async_trait]
impl LinkCache for RedisCache {
    async fn put(&self, link: &Link) -> CacheResult<()> {
        let key = self.build_key(&link.alias);
        let mut conn = self.client.clone();

        let payload = match serde_json::to_string(&CachedLink::from(link)) {
            Ok(json) => json,
            Err(e) => {
                error!("Cache serialization failed for {}: {}", link.alias, e);
                return Ok(());
            }
        };

        match conn
            .set_ex::<_, _, ()>(&key, payload, self.ttl.as_secs())
            .await
        {
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", link.alias, self.ttl.as_secs());
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", link.alias, e);
                Ok(())
            }
        }
    }

    async fn get(&self, alias: &str) -> CacheResult<Option<CachedLink>> {
        let key = self.build_key(alias);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(cached) => {
                    debug!("Cache HIT: {}", alias);
                    Ok(Some(cached))
                }
                Err(e) => {
                    // Corrupt payload reads as a miss and gets evicted.
                    warn!("Cache payload corrupt for {}: {}", alias, e);
                    let _ = conn.del::<_, i32>(&key).await;
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", alias);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", alias, e);
                Ok(None)
            }
        }
    }

    async fn invalidate(&self, alias: &str) -> CacheResult<()> {
        let key = self.build_key(alias);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", alias);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", alias, e);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        let pong: redis::RedisResult<()> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }
}

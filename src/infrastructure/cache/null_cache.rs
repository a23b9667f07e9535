//! No-op cache implementation for testing or disabled caching.

use super::service::{CacheResult, CachedLink, LinkCache};
use crate::domain::entities::Link;
use async_trait::async_trait;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Every read is a miss, so all resolution traffic falls through to the
/// durable store. Used when Redis is unavailable or caching is explicitly
/// disabled.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for NullCache {
    async fn put(&self, _link: &Link) -> CacheResult<()> {
        Ok(())
    }

    async fn get(&self, _alias: &str) -> CacheResult<Option<CachedLink>> {
        Ok(None)
    }

    async fn invalidate(&self, _alias: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

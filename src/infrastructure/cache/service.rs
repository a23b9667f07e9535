//! Cache trait, cached projection, and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::entities::Link;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Denormalized link projection stored under the alias as key.
///
/// Serialized as JSON with camelCase keys and RFC3339 timestamps. The owner
/// is intentionally absent: authorization decisions never read the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLink {
    pub alias: String,
    pub target_url: String,
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_visited_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Link> for CachedLink {
    fn from(link: &Link) -> Self {
        Self {
            alias: link.alias.clone(),
            target_url: link.target_url.clone(),
            visit_count: link.visit_count,
            created_at: link.created_at,
            last_visited_at: link.last_visited_at,
            expires_at: link.expires_at,
        }
    }
}

/// Trait for caching link projections keyed by alias.
///
/// The cache is a read accelerator, never a source of truth: a hit is
/// advisory, an entry may vanish at any time, and implementations must be
/// fail-open — a backend error degrades to a miss (`Ok(None)`) or a no-op
/// rather than failing the caller's operation. No operation may block the
/// caller indefinitely.
///
/// Every write carries the implementation's fixed TTL, independent of the
/// link's own `expires_at`.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - production cache
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process cache
/// - [`crate::infrastructure::cache::NullCache`] - caching disabled
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// Stores the projection of `link`, overwriting any previous entry and
    /// resetting the TTL.
    ///
    /// Implementations log backend errors and return `Ok(())`.
    async fn put(&self, link: &Link) -> CacheResult<()>;

    /// Retrieves the cached projection for an alias.
    ///
    /// Returns `Ok(None)` on miss, expiry, or backend error (fail-open).
    async fn get(&self, alias: &str) -> CacheResult<Option<CachedLink>>;

    /// Removes the cached entry for an alias, if any.
    async fn invalidate(&self, alias: &str) -> CacheResult<()>;

    /// Checks if the cache backend is reachable.
    async fn health_check(&self) -> bool;
}

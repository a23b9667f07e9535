//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A live short link with its visit bookkeeping.
///
/// Canonical form lives in the durable store; the cache holds a serialized
/// projection of it (see [`crate::infrastructure::cache::CachedLink`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Store-assigned record identity. Write operations key on it rather
    /// than the alias, so a reused alias never stands in for a removed
    /// record.
    pub id: i64,
    /// Short identifier, unique among live links, immutable after creation.
    pub alias: String,
    pub target_url: String,
    /// Monotonically non-decreasing; bumped on each successful resolution.
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_visited_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Opaque external identity. `None` means the link is anonymous and
    /// publicly mutable/deletable.
    pub owner_id: Option<i64>,
}

impl Link {
    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true if the link has not been visited since `cutoff`.
    pub fn is_stale_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_visited_at <= cutoff
    }
}

/// Input data for creating a new link.
///
/// `visit_count`, `created_at`, and `last_visited_at` are set by the store
/// at insertion time.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub alias: String,
    pub target_url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Option<i64>,
}

/// Immutable snapshot of a link taken at the moment it left the live set.
///
/// Written exactly once per removal (explicit delete, expiry, or staleness
/// sweep) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedLink {
    pub alias: String,
    pub target_url: String,
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_visited_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Option<i64>,
    pub deleted_at: DateTime<Utc>,
}

/// Authoritative per-link statistics, read from the durable store only.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStats {
    pub target_url: String,
    pub visit_count: i64,
    pub last_visited_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Link> for LinkStats {
    fn from(link: &Link) -> Self {
        Self {
            target_url: link.target_url.clone(),
            visit_count: link.visit_count,
            last_visited_at: link.last_visited_at,
            created_at: link.created_at,
        }
    }
}

//! Repository trait for short link data access.

use chrono::{DateTime, Utc};

use crate::domain::entities::{ArchivedLink, Link, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the durable link store.
///
/// Source of truth for live links and their archived history. The invariant
/// carried by every implementation: no live link is ever hard-deleted
/// without an [`ArchivedLink`] snapshot being written in the same atomic
/// unit, and the `alias` column is unique among live links at all times.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::SqliteLinkRepository`]
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new live link.
    ///
    /// Creation bookkeeping (`visit_count = 0`, `created_at`,
    /// `last_visited_at`) is filled in by the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AliasConflict`] if a live link with the same
    /// alias exists. Enforced by the store's unique constraint, so exactly
    /// one of two concurrent inserts on the same alias wins.
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a live link by its alias.
    async fn find_by_alias(&self, alias: &str) -> Result<Option<Link>, AppError>;

    /// Reverse lookup: finds a live link by its exact target URL.
    ///
    /// When several live links share a target, the oldest one is returned.
    async fn find_by_target(&self, target_url: &str) -> Result<Option<Link>, AppError>;

    /// Replaces the target URL of a live link.
    ///
    /// Keyed on record identity, not the alias: a caller holding a loaded
    /// [`Link`] mutates exactly that record, never a later link that reused
    /// the alias after a removal.
    ///
    /// Returns the updated link, or `None` if the record is no longer live.
    async fn update_target(&self, link_id: i64, new_url: &str) -> Result<Option<Link>, AppError>;

    /// Atomically increments `visit_count` and sets `last_visited_at`.
    ///
    /// The increment happens inside the store (`visit_count + 1` in SQL),
    /// never as a read-then-write from the caller, so concurrent visits
    /// cannot lose updates.
    ///
    /// Returns `false` if no live link has this alias (e.g. it was archived
    /// while the visit was in flight); callers treat that as a no-op.
    async fn record_visit(&self, alias: &str, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Archives and removes a live link as a single atomic unit.
    ///
    /// Writes the [`ArchivedLink`] snapshot and deletes the live row in one
    /// store transaction; a partially applied state is never observable.
    /// Keyed on record identity so a stale handle cannot remove a link that
    /// reused the alias in the meantime.
    ///
    /// Returns `false` if the record is no longer live (already removed).
    async fn archive_and_remove(&self, link_id: i64, now: DateTime<Utc>)
    -> Result<bool, AppError>;

    /// Live links whose `expires_at` is set and `<= now`.
    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, AppError>;

    /// Live links not visited since `cutoff`.
    async fn find_stale_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Link>, AppError>;

    /// Archives and removes every link that is expired at `now` or unvisited
    /// since `stale_cutoff`, one transaction per link.
    ///
    /// A link matching both predicates is archived exactly once, and each
    /// removal is keyed to the matched record's identity: a link deleted and
    /// recreated under the same alias mid-sweep is not touched. Returns the
    /// removed aliases so the caller can invalidate the cache for each.
    async fn sweep_expired_and_stale(
        &self,
        now: DateTime<Utc>,
        stale_cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError>;

    /// Lists all live links, oldest first.
    async fn list_links(&self) -> Result<Vec<Link>, AppError>;

    /// Lists archived links for an alias, oldest first.
    ///
    /// The archive table has no uniqueness constraint; an alias reused after
    /// removal accumulates one snapshot per removal.
    async fn list_archived(&self, alias: &str) -> Result<Vec<ArchivedLink>, AppError>;
}

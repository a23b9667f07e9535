//! Alias resolution service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::entities::{Link, LinkStats, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::infrastructure::cache::LinkCache;
use crate::utils::alias::generate_alias;

/// Default bound on generated-alias retries before giving up.
pub const DEFAULT_MAX_ALIAS_ATTEMPTS: usize = 20;

/// Default ceiling on anonymous link lifetime.
pub fn default_anonymous_max_ttl() -> Duration {
    Duration::hours(12)
}

/// Service owning the shortening, resolution, update, and deletion
/// workflows.
///
/// Composes the durable store (source of truth) with the cache (read
/// accelerator) and decides the population/invalidation policy: reads for
/// redirects go cache-first with store fallback, every other read goes to
/// the store, writes land in the store first and refresh the cache
/// best-effort afterwards.
///
/// Visit bookkeeping is decoupled from the resolve path: successful
/// resolutions enqueue a [`VisitEvent`] consumed by
/// [`crate::domain::visit_worker::run_visit_worker`].
pub struct LinkService<R: LinkRepository> {
    repository: Arc<R>,
    cache: Arc<dyn LinkCache>,
    visit_tx: mpsc::Sender<VisitEvent>,
    anonymous_max_ttl: Duration,
    max_alias_attempts: usize,
}

impl<R: LinkRepository> LinkService<R> {
    /// Creates a new service with default policy (12 h anonymous cap,
    /// 20 generation attempts).
    pub fn new(
        repository: Arc<R>,
        cache: Arc<dyn LinkCache>,
        visit_tx: mpsc::Sender<VisitEvent>,
    ) -> Self {
        Self::with_policy(
            repository,
            cache,
            visit_tx,
            default_anonymous_max_ttl(),
            DEFAULT_MAX_ALIAS_ATTEMPTS,
        )
    }

    /// Creates a new service with explicit policy knobs.
    pub fn with_policy(
        repository: Arc<R>,
        cache: Arc<dyn LinkCache>,
        visit_tx: mpsc::Sender<VisitEvent>,
        anonymous_max_ttl: Duration,
        max_alias_attempts: usize,
    ) -> Self {
        Self {
            repository,
            cache,
            visit_tx,
            anonymous_max_ttl,
            max_alias_attempts,
        }
    }

    /// Creates a short link and returns its alias.
    ///
    /// # Arguments
    ///
    /// - `target_url` - destination URL (shape-validated by the request
    ///   layer before it reaches the core)
    /// - `expires_at` - requested expiry, if any
    /// - `custom_alias` - caller-chosen alias; when absent one is generated
    /// - `owner_id` - caller identity, or `None` for anonymous creation
    ///
    /// # Expiry Policy
    ///
    /// Anonymous links never outlive the configured cap (12 h by default):
    /// the effective expiry is the minimum of the requested one and
    /// `now + cap`, applied even when no expiry was requested.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AliasConflict`] if a live link already holds the
    /// custom alias; concurrent creations of the same alias have exactly one
    /// winner (the store's unique constraint decides).
    /// Returns [`AppError::AliasSpaceExhausted`] if generation keeps
    /// colliding past the retry bound.
    pub async fn shorten(
        &self,
        target_url: String,
        expires_at: Option<DateTime<Utc>>,
        custom_alias: Option<String>,
        owner_id: Option<i64>,
    ) -> Result<String, AppError> {
        let expires_at = self.effective_expiry(expires_at, owner_id);

        let link = match custom_alias {
            // Caller-chosen aliases are never retried: a conflict is the
            // caller's to resolve.
            Some(alias) => {
                self.repository
                    .insert(NewLink {
                        alias,
                        target_url,
                        expires_at,
                        owner_id,
                    })
                    .await?
            }
            None => {
                self.insert_with_generated_alias(target_url, expires_at, owner_id)
                    .await?
            }
        };

        if let Err(e) = self.cache.put(&link).await {
            warn!("cache write failed for new link '{}': {}", link.alias, e);
        }

        Ok(link.alias)
    }

    /// Resolves an alias to its target URL for a redirect.
    ///
    /// Read-through: the cache answers when it can; otherwise the store is
    /// consulted and the cache repopulated best-effort. Either way a visit
    /// event is queued and the target returned without waiting for the
    /// bookkeeping write — a `stats` call racing a fresh `resolve` may lag
    /// by design.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if neither store holds a live link
    /// under `alias`.
    pub async fn resolve(&self, alias: &str) -> Result<String, AppError> {
        let target_url = match self.cache.get(alias).await {
            Ok(Some(cached)) => cached.target_url,
            // Fail-open implementations never return Err, but a miss is the
            // right degradation either way.
            Ok(None) | Err(_) => {
                let link = self
                    .repository
                    .find_by_alias(alias)
                    .await?
                    .ok_or(AppError::NotFound)?;

                if let Err(e) = self.cache.put(&link).await {
                    warn!("cache repopulation failed for '{}': {}", alias, e);
                }

                link.target_url
            }
        };

        // Fire-and-forget: a full or closed queue costs one visit count,
        // never the redirect.
        if let Err(e) = self.visit_tx.try_send(VisitEvent::now(alias)) {
            warn!("dropping visit event for '{}': {}", alias, e);
        }

        debug!("resolved '{}' -> {}", alias, target_url);
        Ok(target_url)
    }

    /// Returns authoritative statistics for an alias.
    ///
    /// Reads the durable store only; the cached projection may lag behind
    /// the real visit count and is never consulted here.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link holds `alias`.
    pub async fn stats(&self, alias: &str) -> Result<LinkStats, AppError> {
        let link = self
            .repository
            .find_by_alias(alias)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(LinkStats::from(&link))
    }

    /// Replaces the target URL of a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link holds `alias`.
    /// Returns [`AppError::Forbidden`] if the link is owned and `caller_id`
    /// is not the owner; unowned links are mutable by anyone.
    pub async fn update_target(
        &self,
        alias: &str,
        new_url: String,
        caller_id: Option<i64>,
    ) -> Result<(), AppError> {
        let link = self
            .repository
            .find_by_alias(alias)
            .await?
            .ok_or(AppError::NotFound)?;

        check_owner(&link, caller_id)?;

        // Keyed to the record the ownership check saw, not the alias: if
        // that record is gone and the alias reused, the write misses.
        let updated = self
            .repository
            .update_target(link.id, &new_url)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Err(e) = self.cache.put(&updated).await {
            warn!("cache refresh failed for '{}': {}", alias, e);
        }

        Ok(())
    }

    /// Archives and removes a link, then invalidates its cache entry.
    ///
    /// Exactly one [`crate::domain::entities::ArchivedLink`] snapshot is
    /// written per removal; a repeated delete observes no live link and
    /// fails with [`AppError::NotFound`].
    ///
    /// # Errors
    ///
    /// Same ownership rules as [`Self::update_target`].
    pub async fn delete(&self, alias: &str, caller_id: Option<i64>) -> Result<(), AppError> {
        let link = self
            .repository
            .find_by_alias(alias)
            .await?
            .ok_or(AppError::NotFound)?;

        check_owner(&link, caller_id)?;

        // Same identity keying as update: only the checked record dies.
        let removed = self
            .repository
            .archive_and_remove(link.id, Utc::now())
            .await?;
        if !removed {
            // The sweeper (or a concurrent delete) got there first.
            return Err(AppError::NotFound);
        }

        if let Err(e) = self.cache.invalidate(alias).await {
            warn!("cache invalidation failed for '{}': {}", alias, e);
        }

        Ok(())
    }

    /// Reverse lookup: the alias of the live link with this exact target.
    ///
    /// Store-only; no cache path exists for this direction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link has that target.
    pub async fn find_by_target(&self, target_url: &str) -> Result<String, AppError> {
        let link = self
            .repository
            .find_by_target(target_url)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(link.alias)
    }

    /// Applies the anonymous-creation cap to a requested expiry.
    fn effective_expiry(
        &self,
        requested: Option<DateTime<Utc>>,
        owner_id: Option<i64>,
    ) -> Option<DateTime<Utc>> {
        if owner_id.is_some() {
            return requested;
        }

        let cap = Utc::now() + self.anonymous_max_ttl;
        Some(requested.map_or(cap, |r| r.min(cap)))
    }

    /// Generates aliases and inserts until one sticks, up to the bound.
    ///
    /// The pre-check keeps the common path to a single read, but the unique
    /// constraint on insert is what settles a generation race.
    async fn insert_with_generated_alias(
        &self,
        target_url: String,
        expires_at: Option<DateTime<Utc>>,
        owner_id: Option<i64>,
    ) -> Result<Link, AppError> {
        for _ in 0..self.max_alias_attempts {
            let alias = generate_alias();

            if self.repository.find_by_alias(&alias).await?.is_some() {
                continue;
            }

            match self
                .repository
                .insert(NewLink {
                    alias,
                    target_url: target_url.clone(),
                    expires_at,
                    owner_id,
                })
                .await
            {
                Ok(link) => return Ok(link),
                Err(AppError::AliasConflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::AliasSpaceExhausted(self.max_alias_attempts))
    }
}

/// Ownership check shared by update and delete.
///
/// An owned link demands a matching caller identity; an unowned link is
/// publicly mutable and deletable.
fn check_owner(link: &Link, caller_id: Option<i64>) -> Result<(), AppError> {
    match link.owner_id {
        Some(owner) if caller_id != Some(owner) => Err(AppError::Forbidden),
        _ => Ok(()),
    }
}

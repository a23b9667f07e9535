//! Background expiry sweep.
//!
//! Periodically archives-and-removes expired and unvisited links from the
//! durable store, then invalidates the cache entry for each removed alias.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::LinkCache;

/// Sweep scheduling knobs.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Time between sweep iterations.
    pub interval: Duration,
    /// Links unvisited for this many days are removed as stale.
    pub unused_days: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            unused_days: 10,
        }
    }
}

/// Spawns the sweep loop.
///
/// Runs until `shutdown` flips; each iteration calls
/// [`LinkRepository::sweep_expired_and_stale`] and invalidates the cache
/// for every removed alias. An iteration failure is logged and the loop
/// waits for the next tick — the process never stops over a failed sweep.
///
/// Per-link transactional archival in the store makes cancellation safe:
/// stopping mid-batch leaves every processed link fully archived-and-removed
/// and the rest untouched for the next run.
pub fn spawn_sweeper<R: LinkRepository + 'static>(
    repository: Arc<R>,
    cache: Arc<dyn LinkCache>,
    config: SweeperConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Sweeper started (interval: {:?}, unused_days: {})",
            config.interval, config.unused_days
        );

        let mut ticker = tokio::time::interval(config.interval);
        // The immediate first tick would sweep at startup; skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            let now = Utc::now();
            let stale_cutoff = now - ChronoDuration::days(config.unused_days);

            match repository.sweep_expired_and_stale(now, stale_cutoff).await {
                Ok(removed) => {
                    for alias in &removed {
                        if let Err(e) = cache.invalidate(alias).await {
                            warn!("cache invalidation failed for swept '{}': {}", alias, e);
                        }
                    }

                    if removed.is_empty() {
                        debug!("sweep found nothing to remove");
                    } else {
                        info!("sweep removed {} links", removed.len());
                    }
                }
                Err(e) => warn!("sweep iteration failed: {}", e),
            }
        }

        info!("Sweeper stopped");
    })
}

//! Asynchronous visit bookkeeping worker.
//!
//! Resolution returns the target URL without waiting for the visit-count
//! write; the event lands on an mpsc queue and this worker drains it.
//! Failures are logged and dropped — a lost visit increment never fails a
//! redirect.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::domain::repositories::LinkRepository;
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::cache::LinkCache;

/// Drains visit events until the channel closes or shutdown is signalled.
///
/// Each event becomes an atomic increment in the store followed by a
/// best-effort cache refresh. An event whose alias no longer resolves
/// (archived or deleted while the visit was in flight) is discarded.
pub async fn run_visit_worker<R: LinkRepository>(
    mut rx: mpsc::Receiver<VisitEvent>,
    repository: Arc<R>,
    cache: Arc<dyn LinkCache>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let event = tokio::select! {
            ev = rx.recv() => match ev {
                Some(ev) => ev,
                None => break,
            },
            _ = shutdown.changed() => break,
        };

        match repository.record_visit(&event.alias, event.visited_at).await {
            Ok(true) => {
                // Refresh the cached projection with the new count.
                match repository.find_by_alias(&event.alias).await {
                    Ok(Some(link)) => {
                        if let Err(e) = cache.put(&link).await {
                            warn!("cache refresh failed for '{}': {}", event.alias, e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("reload after visit failed for '{}': {}", event.alias, e),
                }
            }
            Ok(false) => {
                // Link was swept or deleted between resolve and bookkeeping.
                debug!("dropping visit for gone alias '{}'", event.alias);
            }
            Err(e) => warn!("visit bookkeeping failed for '{}': {}", event.alias, e),
        }
    }

    debug!("visit worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Link;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::MemoryCache;
    use chrono::Utc;
    use std::time::Duration;

    fn live_link(alias: &str, visits: i64) -> Link {
        let now = Utc::now();
        Link {
            id: 1,
            alias: alias.to_string(),
            target_url: "https://example.com".to_string(),
            visit_count: visits,
            created_at: now,
            last_visited_at: now,
            expires_at: None,
            owner_id: None,
        }
    }

    #[tokio::test]
    async fn test_worker_records_visit_and_refreshes_cache() {
        let mut repo = MockLinkRepository::new();
        repo.expect_record_visit()
            .withf(|alias, _| alias == "abc123")
            .times(1)
            .returning(|_, _| Ok(true));
        repo.expect_find_by_alias()
            .times(1)
            .returning(|_| Ok(Some(live_link("abc123", 1))));

        let cache = Arc::new(MemoryCache::new(Duration::from_secs(60)));
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_visit_worker(
            rx,
            Arc::new(repo),
            cache.clone(),
            shutdown_rx,
        ));

        tx.send(VisitEvent::now("abc123")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let cached = cache.get("abc123").await.unwrap().unwrap();
        assert_eq!(cached.visit_count, 1);
    }

    #[tokio::test]
    async fn test_worker_discards_visit_for_gone_alias() {
        let mut repo = MockLinkRepository::new();
        repo.expect_record_visit().times(1).returning(|_, _| Ok(false));
        // No reload when the alias is gone.
        repo.expect_find_by_alias().times(0);

        let cache: Arc<dyn LinkCache> = Arc::new(MemoryCache::new(Duration::from_secs(60)));
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_visit_worker(rx, Arc::new(repo), cache, shutdown_rx));

        tx.send(VisitEvent::now("gone")).await.unwrap();
        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown_signal() {
        let repo = MockLinkRepository::new();
        let cache: Arc<dyn LinkCache> = Arc::new(MemoryCache::new(Duration::from_secs(60)));
        let (_tx, rx) = mpsc::channel::<VisitEvent>(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run_visit_worker(rx, Arc::new(repo), cache, shutdown_rx));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop on shutdown")
            .unwrap();
    }
}

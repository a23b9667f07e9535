#![allow(dead_code)]

use chrono::{DateTime, Utc};
use shortlink_core::application::services::LinkService;
use shortlink_core::domain::visit_worker::run_visit_worker;
use shortlink_core::infrastructure::cache::{LinkCache, MemoryCache};
use shortlink_core::infrastructure::persistence::SqliteLinkRepository;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// A pool over a fresh in-memory database with migrations applied.
///
/// Kept at one connection: an in-memory SQLite database exists
/// per-connection, and a wider pool would split the data.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

/// Seeds a live link directly, bypassing the service-level expiry cap.
pub async fn seed_link(
    pool: &SqlitePool,
    alias: &str,
    target_url: &str,
    expires_at: Option<DateTime<Utc>>,
    last_visited_at: DateTime<Utc>,
    owner_id: Option<i64>,
) {
    sqlx::query(
        "INSERT INTO links (alias, target_url, visit_count, created_at, last_visited_at, expires_at, owner_id) \
         VALUES (?, ?, 0, ?, ?, ?, ?)",
    )
    .bind(alias)
    .bind(target_url)
    .bind(Utc::now())
    .bind(last_visited_at)
    .bind(expires_at)
    .bind(owner_id)
    .execute(pool)
    .await
    .expect("seed link");
}

/// Wired resolver with a real store, a real in-process cache, and a live
/// visit worker.
pub struct TestHarness {
    pub links: Arc<LinkService<SqliteLinkRepository>>,
    pub repository: Arc<SqliteLinkRepository>,
    pub cache: Arc<MemoryCache>,
    pub worker: JoinHandle<()>,
    pub shutdown_tx: watch::Sender<bool>,
}

impl TestHarness {
    pub async fn start(pool: SqlitePool) -> Self {
        let repository = Arc::new(SqliteLinkRepository::new(Arc::new(pool)));
        let cache = Arc::new(MemoryCache::new(Duration::from_secs(3600)));

        let (visit_tx, visit_rx) = mpsc::channel(1024);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(run_visit_worker(
            visit_rx,
            repository.clone(),
            cache.clone() as Arc<dyn LinkCache>,
            shutdown_rx,
        ));

        let links = Arc::new(LinkService::new(
            repository.clone(),
            cache.clone() as Arc<dyn LinkCache>,
            visit_tx,
        ));

        Self {
            links,
            repository,
            cache,
            worker,
            shutdown_tx,
        }
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.worker.await;
    }
}

/// Polls `cond` until it holds or the deadline passes.
pub async fn eventually<F, Fut>(mut cond: F, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if cond().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    cond().await
}

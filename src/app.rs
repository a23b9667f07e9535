//! Wiring and runtime setup.
//!
//! Builds the durable store, cache, resolver, visit worker, and sweeper
//! from a [`Config`] and hands the embedding process a ready [`App`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::application::services::LinkService;
use crate::application::sweeper::{SweeperConfig, spawn_sweeper};
use crate::config::Config;
use crate::domain::visit_worker::run_visit_worker;
use crate::infrastructure::cache::{LinkCache, MemoryCache, RedisCache};
use crate::infrastructure::persistence::SqliteLinkRepository;
use crate::state::AppState;

/// A fully wired alias-resolution core.
///
/// Owns the background tasks; [`App::shutdown`] stops them cleanly. The
/// transport layer consumes [`App::state`].
pub struct App {
    state: AppState<SqliteLinkRepository>,
    visit_worker: JoinHandle<()>,
    sweeper: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Connects the store, applies migrations, selects the cache backend,
    /// and spawns the visit worker and sweeper.
    ///
    /// If Redis is configured but unreachable, the in-process cache takes
    /// over rather than failing startup — the cache is best-effort by
    /// contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection or migration fails.
    pub async fn start(config: Config) -> Result<Self> {
        config.print_summary();

        // An in-memory SQLite database is per-connection; a bigger pool
        // would hand out five empty databases.
        let max_connections = if config.database_url.contains(":memory:")
            || config.database_url.contains("mode=memory")
        {
            1
        } else {
            5
        };

        let options =
            SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;

        let cache_ttl = Duration::from_secs(config.cache_ttl_seconds);
        let cache: Arc<dyn LinkCache> = if let Some(redis_url) = &config.redis_url {
            match RedisCache::connect(redis_url, cache_ttl).await {
                Ok(redis) => {
                    tracing::info!("Cache enabled (Redis)");
                    Arc::new(redis)
                }
                Err(e) => {
                    tracing::warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
                    Arc::new(MemoryCache::new(cache_ttl))
                }
            }
        } else {
            tracing::info!("Cache enabled (in-process)");
            Arc::new(MemoryCache::new(cache_ttl))
        };

        let repository = Arc::new(SqliteLinkRepository::new(Arc::new(pool)));

        let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let visit_worker = tokio::spawn(run_visit_worker(
            visit_rx,
            repository.clone(),
            cache.clone(),
            shutdown_rx.clone(),
        ));
        tracing::info!("Visit worker started");

        let sweeper = spawn_sweeper(
            repository.clone(),
            cache.clone(),
            SweeperConfig {
                interval: Duration::from_secs(config.sweep_interval_seconds),
                unused_days: config.sweep_unused_days,
            },
            shutdown_rx,
        );

        let links = Arc::new(LinkService::with_policy(
            repository,
            cache.clone(),
            visit_tx.clone(),
            chrono::Duration::hours(config.anon_max_ttl_hours),
            config.max_alias_attempts,
        ));

        Ok(Self {
            state: AppState {
                links,
                cache,
                visit_tx,
            },
            visit_worker,
            sweeper,
            shutdown_tx,
        })
    }

    /// The dependency bundle for the transport layer.
    pub fn state(&self) -> AppState<SqliteLinkRepository> {
        self.state.clone()
    }

    /// Stops the background tasks and waits for them to finish.
    ///
    /// Safe at any point: the sweeper's per-link transactions mean a sweep
    /// interrupted here leaves no half-archived link behind.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.visit_worker.await?;
        self.sweeper.await?;
        tracing::info!("Background tasks stopped");
        Ok(())
    }
}

/// Initializes the tracing subscriber from the environment.
///
/// Meant for embedding binaries; calling it twice is a no-op failure that
/// is ignored.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

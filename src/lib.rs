//! # shortlink-core
//!
//! The alias-resolution core of a URL shortener: alias generation, the
//! durable-store/cache consistency protocol, visit-count bookkeeping, and
//! the background expiry sweep.
//!
//! The HTTP transport, request validation, and identity verification are
//! external collaborators. They call the operation set on
//! [`application::services::LinkService`] and map its errors onto their own
//! responses; identity reaches this crate only as an opaque
//! "owner id or none".
//!
//! ## Architecture
//!
//! Clean layering, leaves first:
//!
//! - **Domain** ([`domain`]) - entities, repository traits, the visit
//!   bookkeeping worker
//! - **Application** ([`application`]) - the alias resolver and the expiry
//!   sweeper
//! - **Infrastructure** ([`infrastructure`]) - SQLite store, Redis and
//!   in-process caches
//!
//! The store is the source of truth; the cache is a read accelerator with a
//! fixed TTL that may be absent, stale, or evicted at any time. Reads for
//! redirects go cache-first; everything feeding statistics or authorization
//! bypasses the cache.
//!
//! ## Quick Start
//!
//! ```no_run
//! use shortlink_core::app::App;
//! use shortlink_core::config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::start(config::load_from_env()?).await?;
//!     let state = app.state();
//!
//!     let alias = state
//!         .links
//!         .shorten("https://example.com".to_string(), None, None, None)
//!         .await?;
//!     let url = state.links.resolve(&alias).await?;
//!     assert_eq!(url, "https://example.com");
//!
//!     app.shutdown().await
//! }
//! ```

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod app;
pub mod config;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
pub mod prelude {
    pub use crate::app::App;
    pub use crate::application::services::LinkService;
    pub use crate::application::sweeper::{SweeperConfig, spawn_sweeper};
    pub use crate::domain::entities::{ArchivedLink, Link, LinkStats, NewLink};
    pub use crate::domain::repositories::LinkRepository;
    pub use crate::error::AppError;
    pub use crate::infrastructure::cache::{LinkCache, MemoryCache, NullCache, RedisCache};
    pub use crate::infrastructure::persistence::SqliteLinkRepository;
    pub use crate::state::AppState;
}

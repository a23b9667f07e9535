//! Durable store implementations.

mod sqlite_link_repository;

pub use sqlite_link_repository::SqliteLinkRepository;

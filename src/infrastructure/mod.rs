//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis, in-memory, and no-op)
//! - [`persistence`] - SQLite repository implementation

pub mod cache;
pub mod persistence;

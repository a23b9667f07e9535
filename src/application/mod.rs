//! Application layer orchestrating domain operations.
//!
//! - [`services::LinkService`] - shortening, resolution, update, deletion
//! - [`sweeper`] - periodic removal of expired and stale links
//!
//! Services consume repository and cache traits injected at construction;
//! nothing here touches a concrete store.

pub mod services;
pub mod sweeper;

//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures without infrastructure concerns.
//!
//! - [`Link`] - a live shortened URL mapping
//! - [`NewLink`] - creation input (store fills in bookkeeping fields)
//! - [`ArchivedLink`] - immutable removal-time snapshot
//! - [`LinkStats`] - authoritative statistics projection

pub mod link;

pub use link::{ArchivedLink, Link, LinkStats, NewLink};

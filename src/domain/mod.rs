//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`visit_event`] - Visit bookkeeping event model
//! - [`visit_worker`] - Asynchronous visit bookkeeping worker
//!
//! # Visit Bookkeeping Flow
//!
//! 1. The resolver answers a redirect from cache or store
//! 2. A [`visit_event::VisitEvent`] is queued on an async channel
//! 3. [`visit_worker::run_visit_worker`] applies the atomic increment and
//!    refreshes the cached projection
//!
//! The domain layer has no dependency on concrete storage; repository
//! traits here are implemented in [`crate::infrastructure`].

pub mod entities;
pub mod repositories;
pub mod visit_event;
pub mod visit_worker;

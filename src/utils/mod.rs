//! Utility functions shared across layers.
//!
//! - [`alias`] - random alias generation
//! - [`db_error`] - store error classification

pub mod alias;
pub mod db_error;

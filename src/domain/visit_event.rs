//! Visit bookkeeping event model.

use chrono::{DateTime, Utc};

/// A successful resolution, queued for asynchronous bookkeeping.
///
/// Carries the observation time rather than letting the worker re-read the
/// clock, so `last_visited_at` reflects when the redirect was served, not
/// when the queue drained.
#[derive(Debug, Clone)]
pub struct VisitEvent {
    pub alias: String,
    pub visited_at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn now(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            visited_at: Utc::now(),
        }
    }
}

//! Crate-wide error taxonomy.
//!
//! Storage-level integrity violations are translated into these variants at
//! the repository boundary (see [`crate::utils::db_error`]); raw `sqlx`
//! errors never cross it except wrapped as [`AppError::Storage`].
//!
//! Cache failures are deliberately NOT part of this taxonomy: the cache is
//! advisory and its errors degrade to misses inside the cache layer (see
//! [`crate::infrastructure::cache::CacheError`]).

use thiserror::Error;

/// Errors surfaced by the alias-resolution core.
///
/// The transport layer maps these onto its own responses
/// (not-found -> 404, forbidden -> 403, conflict -> 409, the rest -> 500).
#[derive(Debug, Error)]
pub enum AppError {
    /// The requested or generated alias already points at a live link.
    #[error("alias '{0}' already exists")]
    AliasConflict(String),

    /// Bounded retry for generated aliases ran out of attempts.
    ///
    /// Distinct from [`AppError::AliasConflict`] so callers can tell
    /// "pick another alias yourself" apart from "retry the request".
    #[error("failed to generate a free alias after {0} attempts")]
    AliasSpaceExhausted(usize),

    /// No live link for the given alias or target URL.
    #[error("short link not found")]
    NotFound,

    /// Caller identity does not match the link's owner.
    #[error("caller is not the owner of this link")]
    Forbidden,

    /// Underlying store failure not caused by the caller.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    /// True for the variants a client can act on (as opposed to retrying
    /// later or reporting a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::AliasConflict(_) | Self::NotFound | Self::Forbidden
        )
    }
}

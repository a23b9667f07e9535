//! Store error classification.

/// True if the error is a unique-constraint violation.
///
/// SQLite does not report the violated constraint's name through sqlx, but
/// `links.alias` carries the only unique constraint in the schema, so the
/// kind alone identifies an alias conflict.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

//! SQLite implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::domain::entities::{ArchivedLink, Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation;

const LINK_COLUMNS: &str =
    "id, alias, target_url, visit_count, created_at, last_visited_at, expires_at, owner_id";

/// SQLite repository for link storage, archival, and sweeping.
///
/// The `links` table carries the unique constraint on `alias` that settles
/// concurrent insert races; archival-and-removal runs as one transaction so
/// a link is never observable as neither live nor archived.
pub struct SqliteLinkRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn map_link(row: &SqliteRow) -> Result<Link, sqlx::Error> {
        Ok(Link {
            id: row.try_get("id")?,
            alias: row.try_get("alias")?,
            target_url: row.try_get("target_url")?,
            visit_count: row.try_get("visit_count")?,
            created_at: row.try_get("created_at")?,
            last_visited_at: row.try_get("last_visited_at")?,
            expires_at: row.try_get("expires_at")?,
            owner_id: row.try_get("owner_id")?,
        })
    }

    fn map_archived(row: &SqliteRow) -> Result<ArchivedLink, sqlx::Error> {
        Ok(ArchivedLink {
            alias: row.try_get("alias")?,
            target_url: row.try_get("target_url")?,
            visit_count: row.try_get("visit_count")?,
            created_at: row.try_get("created_at")?,
            last_visited_at: row.try_get("last_visited_at")?,
            expires_at: row.try_get("expires_at")?,
            owner_id: row.try_get("owner_id")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

#[async_trait]
impl LinkRepository for SqliteLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO links (alias, target_url, visit_count, created_at, last_visited_at, expires_at, owner_id) \
             VALUES (?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(&new_link.alias)
        .bind(&new_link.target_url)
        .bind(now)
        .bind(now)
        .bind(new_link.expires_at)
        .bind(new_link.owner_id)
        .execute(self.pool.as_ref())
        .await;

        match result {
            Ok(done) => Ok(Link {
                id: done.last_insert_rowid(),
                alias: new_link.alias,
                target_url: new_link.target_url,
                visit_count: 0,
                created_at: now,
                last_visited_at: now,
                expires_at: new_link.expires_at,
                owner_id: new_link.owner_id,
            }),
            Err(e) if is_unique_violation(&e) => Err(AppError::AliasConflict(new_link.alias)),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE alias = ?"
        ))
        .bind(alias)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(Self::map_link).transpose().map_err(Into::into)
    }

    async fn find_by_target(&self, target_url: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE target_url = ? ORDER BY id LIMIT 1"
        ))
        .bind(target_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.as_ref().map(Self::map_link).transpose().map_err(Into::into)
    }

    async fn update_target(&self, link_id: i64, new_url: &str) -> Result<Option<Link>, AppError> {
        let result = sqlx::query("UPDATE links SET target_url = ? WHERE id = ?")
            .bind(new_url)
            .bind(link_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(&format!("SELECT {LINK_COLUMNS} FROM links WHERE id = ?"))
            .bind(link_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(Self::map_link).transpose().map_err(Into::into)
    }

    async fn record_visit(&self, alias: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        // The increment happens inside the statement; two concurrent visits
        // cannot read the same count.
        let result = sqlx::query(
            "UPDATE links SET visit_count = visit_count + 1, last_visited_at = ? WHERE alias = ?",
        )
        .bind(at)
        .bind(alias)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn archive_and_remove(
        &self,
        link_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // Keyed on id: if the record was removed and its alias re-registered
        // since the caller loaded it, the fresh link is not touched.
        let row = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE id = ?"
        ))
        .bind(link_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            // Record no longer live; dropping tx rolls back.
            return Ok(false);
        };
        let link = Self::map_link(&row).map_err(AppError::from)?;

        sqlx::query(
            "INSERT INTO archived_links \
             (alias, target_url, visit_count, created_at, last_visited_at, expires_at, owner_id, deleted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&link.alias)
        .bind(&link.target_url)
        .bind(link.visit_count)
        .bind(link.created_at)
        .bind(link.last_visited_at)
        .bind(link.expires_at)
        .bind(link.owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(link_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM links \
             WHERE expires_at IS NOT NULL AND expires_at <= ? ORDER BY id"
        ))
        .bind(now)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|r| Self::map_link(r).map_err(Into::into))
            .collect()
    }

    async fn find_stale_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE last_visited_at <= ? ORDER BY id"
        ))
        .bind(cutoff)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|r| Self::map_link(r).map_err(Into::into))
            .collect()
    }

    async fn sweep_expired_and_stale(
        &self,
        now: DateTime<Utc>,
        stale_cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        // One row per link, so a link matching both predicates is selected
        // (and archived) once.
        let matched: Vec<(i64, String)> = sqlx::query_as(
            "SELECT id, alias FROM links \
             WHERE (expires_at IS NOT NULL AND expires_at <= ?) OR last_visited_at <= ? \
             ORDER BY id",
        )
        .bind(now)
        .bind(stale_cutoff)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut removed = Vec::with_capacity(matched.len());
        for (id, alias) in matched {
            // Per-record transaction keyed to the matched id; a link removed
            // by a concurrent delete drops out of the batch, and one
            // recreated under the same alias is not the matched record.
            if self.archive_and_remove(id, now).await? {
                removed.push(alias);
            }
        }

        Ok(removed)
    }

    async fn list_links(&self) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query(&format!("SELECT {LINK_COLUMNS} FROM links ORDER BY id"))
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.iter()
            .map(|r| Self::map_link(r).map_err(Into::into))
            .collect()
    }

    async fn list_archived(&self, alias: &str) -> Result<Vec<ArchivedLink>, AppError> {
        let rows = sqlx::query(
            "SELECT alias, target_url, visit_count, created_at, last_visited_at, expires_at, owner_id, deleted_at \
             FROM archived_links WHERE alias = ? ORDER BY id",
        )
        .bind(alias)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|r| Self::map_archived(r).map_err(Into::into))
            .collect()
    }
}

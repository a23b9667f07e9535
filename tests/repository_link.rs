mod common;

use chrono::{Duration, Utc};
use shortlink_core::domain::entities::NewLink;
use shortlink_core::domain::repositories::LinkRepository;
use shortlink_core::error::AppError;
use shortlink_core::infrastructure::persistence::SqliteLinkRepository;
use std::sync::Arc;
use tokio::task::JoinSet;

fn new_link(alias: &str, url: &str) -> NewLink {
    NewLink {
        alias: alias.to_string(),
        target_url: url.to_string(),
        expires_at: None,
        owner_id: None,
    }
}

#[tokio::test]
async fn test_insert_and_find_by_alias() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let link = repo
        .insert(new_link("abc123", "https://example.com"))
        .await
        .unwrap();
    assert_eq!(link.visit_count, 0);

    let found = repo.find_by_alias("abc123").await.unwrap().unwrap();
    assert_eq!(found.id, link.id);
    assert_eq!(found.alias, "abc123");
    assert_eq!(found.target_url, "https://example.com");
    assert!((found.created_at - link.created_at).num_seconds().abs() < 1);
}

#[tokio::test]
async fn test_find_by_alias_not_found() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    assert!(repo.find_by_alias("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_duplicate_alias_conflicts() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    repo.insert(new_link("abc123", "https://one.example.com"))
        .await
        .unwrap();

    let result = repo
        .insert(new_link("abc123", "https://two.example.com"))
        .await;
    assert!(matches!(result, Err(AppError::AliasConflict(a)) if a == "abc123"));

    // The loser did not overwrite the winner.
    let kept = repo.find_by_alias("abc123").await.unwrap().unwrap();
    assert_eq!(kept.target_url, "https://one.example.com");
}

#[tokio::test]
async fn test_concurrent_inserts_have_one_winner() {
    let pool = common::test_pool().await;
    let repo = Arc::new(SqliteLinkRepository::new(Arc::new(pool)));

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let repo = repo.clone();
        tasks.spawn(async move {
            repo.insert(new_link("race01", &format!("https://example.com/{i}")))
                .await
        });
    }

    let mut winners = 0;
    let mut conflicts = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => winners += 1,
            Err(AppError::AliasConflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_find_by_target_prefers_oldest() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    repo.insert(new_link("first1", "https://same.example.com"))
        .await
        .unwrap();
    repo.insert(new_link("second", "https://same.example.com"))
        .await
        .unwrap();

    let found = repo
        .find_by_target("https://same.example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.alias, "first1");
}

#[tokio::test]
async fn test_update_target() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let link = repo
        .insert(new_link("abc123", "https://old.example.com"))
        .await
        .unwrap();

    let updated = repo
        .update_target(link.id, "https://new.example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.target_url, "https://new.example.com");

    assert!(
        repo.update_target(link.id + 1000, "https://new.example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_record_visit_updates_bookkeeping() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let created = repo
        .insert(new_link("abc123", "https://example.com"))
        .await
        .unwrap();

    let at = Utc::now() + Duration::seconds(5);
    assert!(repo.record_visit("abc123", at).await.unwrap());

    let link = repo.find_by_alias("abc123").await.unwrap().unwrap();
    assert_eq!(link.visit_count, 1);
    assert!(link.last_visited_at > created.last_visited_at);
}

#[tokio::test]
async fn test_record_visit_on_missing_alias_is_noop() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    assert!(!repo.record_visit("missing", Utc::now()).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_visits_lose_no_increment() {
    let pool = common::test_pool().await;
    let repo = Arc::new(SqliteLinkRepository::new(Arc::new(pool)));

    repo.insert(new_link("abc123", "https://example.com"))
        .await
        .unwrap();

    const VISITS: usize = 25;
    let mut tasks = JoinSet::new();
    for _ in 0..VISITS {
        let repo = repo.clone();
        tasks.spawn(async move { repo.record_visit("abc123", Utc::now()).await });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().unwrap());
    }

    let link = repo.find_by_alias("abc123").await.unwrap().unwrap();
    assert_eq!(link.visit_count, VISITS as i64);
}

#[tokio::test]
async fn test_archive_and_remove() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let link = repo
        .insert(new_link("abc123", "https://example.com"))
        .await
        .unwrap();
    repo.record_visit("abc123", Utc::now()).await.unwrap();

    let deleted_at = Utc::now();
    assert!(repo.archive_and_remove(link.id, deleted_at).await.unwrap());

    // Live row gone, exactly one snapshot with the final state.
    assert!(repo.find_by_alias("abc123").await.unwrap().is_none());
    let archived = repo.list_archived("abc123").await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].target_url, link.target_url);
    assert_eq!(archived[0].visit_count, 1);
    assert!((archived[0].deleted_at - deleted_at).num_seconds().abs() < 1);

    // A second removal finds nothing and archives nothing.
    assert!(!repo.archive_and_remove(link.id, Utc::now()).await.unwrap());
    assert_eq!(repo.list_archived("abc123").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_alias_reusable_after_removal() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let first = repo
        .insert(new_link("abc123", "https://first.example.com"))
        .await
        .unwrap();
    repo.archive_and_remove(first.id, Utc::now()).await.unwrap();

    // The alias is free again; the archive keeps one row per removal.
    let second = repo
        .insert(new_link("abc123", "https://second.example.com"))
        .await
        .unwrap();
    repo.archive_and_remove(second.id, Utc::now()).await.unwrap();

    let archived = repo.list_archived("abc123").await.unwrap();
    assert_eq!(archived.len(), 2);
    assert_eq!(archived[0].target_url, "https://first.example.com");
    assert_eq!(archived[1].target_url, "https://second.example.com");
}

#[tokio::test]
async fn test_stale_handle_cannot_touch_recreated_alias() {
    let pool = common::test_pool().await;
    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let first = repo
        .insert(new_link("abc123", "https://first.example.com"))
        .await
        .unwrap();
    assert!(repo.archive_and_remove(first.id, Utc::now()).await.unwrap());

    let second = repo
        .insert(new_link("abc123", "https://second.example.com"))
        .await
        .unwrap();
    assert_ne!(second.id, first.id);

    // Writes keyed to the removed record miss the recreated link: a sweep
    // batch (or delete) that matched the predecessor leaves it alone.
    assert!(!repo.archive_and_remove(first.id, Utc::now()).await.unwrap());
    assert!(
        repo.update_target(first.id, "https://evil.example.com")
            .await
            .unwrap()
            .is_none()
    );

    let kept = repo.find_by_alias("abc123").await.unwrap().unwrap();
    assert_eq!(kept.id, second.id);
    assert_eq!(kept.target_url, "https://second.example.com");
    assert_eq!(repo.list_archived("abc123").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_find_expired_and_stale() {
    let pool = common::test_pool().await;
    let now = Utc::now();

    common::seed_link(
        &pool,
        "expird",
        "https://a.example.com",
        Some(now - Duration::hours(1)),
        now,
        None,
    )
    .await;
    common::seed_link(
        &pool,
        "stale1",
        "https://b.example.com",
        None,
        now - Duration::days(30),
        None,
    )
    .await;
    common::seed_link(&pool, "fresh1", "https://c.example.com", None, now, None).await;

    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let expired = repo.find_expired(now).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].alias, "expird");

    let stale = repo.find_stale_since(now - Duration::days(10)).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].alias, "stale1");
}

#[tokio::test]
async fn test_sweep_removes_expired_and_stale_once() {
    let pool = common::test_pool().await;
    let now = Utc::now();

    common::seed_link(
        &pool,
        "expird",
        "https://a.example.com",
        Some(now - Duration::hours(1)),
        now,
        None,
    )
    .await;
    common::seed_link(
        &pool,
        "stale1",
        "https://b.example.com",
        None,
        now - Duration::days(30),
        None,
    )
    .await;
    // Matches both predicates; must be archived exactly once.
    common::seed_link(
        &pool,
        "both01",
        "https://c.example.com",
        Some(now - Duration::hours(2)),
        now - Duration::days(30),
        None,
    )
    .await;
    common::seed_link(&pool, "fresh1", "https://d.example.com", None, now, None).await;

    let repo = SqliteLinkRepository::new(Arc::new(pool));

    let mut removed = repo
        .sweep_expired_and_stale(now, now - Duration::days(10))
        .await
        .unwrap();
    removed.sort();
    assert_eq!(removed, vec!["both01", "expird", "stale1"]);

    assert!(repo.find_by_alias("fresh1").await.unwrap().is_some());
    assert!(repo.find_by_alias("both01").await.unwrap().is_none());
    assert_eq!(repo.list_archived("both01").await.unwrap().len(), 1);

    // Live set now holds only the fresh link.
    let remaining = repo.list_links().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].alias, "fresh1");
}

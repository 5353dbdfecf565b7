mod common;

use common::{Failure, FakeStore};
use devgate_core::{
    ActivityCategory, ActivityFeed, CategoryItem, FeedConfig, FeedError, FeedIssueKind,
    FeedReport, SENTINEL_ID,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const BUDGET: Duration = Duration::from_secs(5);

async fn run(store: FakeStore) -> FeedReport {
    ActivityFeed::new(Arc::new(store))
        .activity_feed_within(BUDGET)
        .await
        .unwrap()
}

fn keys(report: &FeedReport) -> Vec<(String, ActivityCategory, String)> {
    report
        .items
        .iter()
        .map(|item| {
            (
                item.user.username.clone(),
                item.category(),
                item.item_id().to_string(),
            )
        })
        .collect()
}

fn populated_store() -> FakeStore {
    FakeStore::new()
        .with_user("u1")
        .with_user("u2")
        .with_user("u3")
        .with_item("u1", ActivityCategory::Skill, "rust", Some(100))
        .with_item("u1", ActivityCategory::Objective, "ship", Some(300))
        .with_item("u2", ActivityCategory::Skill, "go", Some(250))
        .with_item("u2", ActivityCategory::Project, "feed", Some(200))
        .with_item("u3", ActivityCategory::Project, "cli", Some(150))
}

#[tokio::test]
async fn three_user_scenario_orders_by_recency() {
    let store = FakeStore::new()
        .with_user("u1")
        .with_user("u2")
        .with_user("u3")
        .with_item("u1", ActivityCategory::Skill, "skill-1", Some(100))
        .with_item("u2", ActivityCategory::Project, "project-2", Some(200));

    let report = run(store).await;

    assert_eq!(
        keys(&report),
        vec![
            (
                "u2".to_string(),
                ActivityCategory::Project,
                "project-2".to_string()
            ),
            ("u1".to_string(), ActivityCategory::Skill, "skill-1".to_string()),
        ]
    );
    assert!(report.issues.is_empty());
    assert!(report.is_complete());
}

#[tokio::test]
async fn feed_never_contains_sentinels_and_keeps_every_real_item() {
    let report = run(populated_store()).await;

    assert!(report.items.iter().all(|item| item.item_id() != SENTINEL_ID));
    assert_eq!(report.items.len(), 5);

    let mut ids: Vec<String> = report
        .items
        .iter()
        .map(|item| item.item_id().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids, vec!["cli", "feed", "go", "rust", "ship"]);
}

#[tokio::test]
async fn items_are_tagged_with_owner_profile() {
    let report = run(populated_store()).await;

    let go = report
        .items
        .iter()
        .find(|item| item.item_id() == "go")
        .unwrap();
    assert_eq!(go.user.username, "u2");
    assert_eq!(go.user.display_name.as_deref(), Some("u2 display"));
    assert!(matches!(go.item, CategoryItem::Skill(_)));
}

#[tokio::test]
async fn adjacent_items_are_in_non_increasing_recency_and_runs_are_repeatable() {
    let store = Arc::new(
        populated_store()
            .with_item("u3", ActivityCategory::Skill, "tie-b", Some(150))
            .with_item("u1", ActivityCategory::Skill, "tie-a", Some(150)),
    );
    let feed = ActivityFeed::new(Arc::clone(&store));

    let first = feed.activity_feed_within(BUDGET).await.unwrap();
    let second = feed.activity_feed_within(BUDGET).await.unwrap();

    for pair in first.items.windows(2) {
        assert!(pair[0].modified_at() >= pair[1].modified_at());
    }
    assert_eq!(first, second);

    let order: Vec<&str> = first.items.iter().map(|item| item.item_id()).collect();
    assert_eq!(
        order,
        vec!["ship", "go", "feed", "tie-a", "tie-b", "cli", "rust"]
    );
}

#[tokio::test]
async fn one_failed_partition_is_isolated_and_reported() {
    let failing = run(populated_store().failing(
        "u2",
        ActivityCategory::Skill,
        Failure::Unavailable,
    ))
    .await;

    let without_pair = FakeStore::new()
        .with_user("u1")
        .with_user("u2")
        .with_user("u3")
        .with_item("u1", ActivityCategory::Skill, "rust", Some(100))
        .with_item("u1", ActivityCategory::Objective, "ship", Some(300))
        .with_item("u2", ActivityCategory::Project, "feed", Some(200))
        .with_item("u3", ActivityCategory::Project, "cli", Some(150));
    let expected = run(without_pair).await;

    assert_eq!(failing.items, expected.items);
    assert_eq!(failing.issues.len(), 1);
    let issue = &failing.issues[0];
    assert_eq!(issue.user.username, "u2");
    assert_eq!(issue.category, ActivityCategory::Skill);
    assert_eq!(issue.kind, FeedIssueKind::Unavailable);
    assert!(issue.item_id.is_none());
    assert_eq!(failing.unreadable_partitions(), 1);
}

#[tokio::test]
async fn permission_denied_is_reported_with_its_kind() {
    let report = run(populated_store().failing(
        "u3",
        ActivityCategory::Project,
        Failure::PermissionDenied,
    ))
    .await;

    assert_eq!(report.items.len(), 4);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].kind, FeedIssueKind::PermissionDenied);
}

#[tokio::test]
async fn empty_store_yields_empty_report() {
    let store = Arc::new(FakeStore::new());
    let report = ActivityFeed::new(Arc::clone(&store))
        .activity_feed_within(BUDGET)
        .await
        .unwrap();

    assert_eq!(report, FeedReport::default());
    assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn enumeration_failure_is_terminal() {
    let err = ActivityFeed::new(Arc::new(populated_store().failing_enumeration()))
        .activity_feed_within(BUDGET)
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::Enumeration(_)));
}

#[tokio::test(start_paused = true)]
async fn enumeration_outliving_deadline_is_terminal() {
    let err = ActivityFeed::new(Arc::new(populated_store().hanging_enumeration()))
        .activity_feed_within(Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::EnumerationTimedOut));
}

#[tokio::test(start_paused = true)]
async fn deadline_returns_partial_feed_with_pending_pairs() {
    let store = populated_store().hanging("u1", ActivityCategory::Objective);
    let deadline = Instant::now() + Duration::from_millis(200);

    let report = ActivityFeed::new(Arc::new(store))
        .activity_feed(deadline)
        .await
        .unwrap();

    let ids: Vec<&str> = report.items.iter().map(|item| item.item_id()).collect();
    assert_eq!(ids, vec!["go", "feed", "cli", "rust"]);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].user.username, "u1");
    assert_eq!(report.issues[0].category, ActivityCategory::Objective);
    assert_eq!(report.issues[0].kind, FeedIssueKind::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn in_flight_fetches_never_exceed_the_ceiling() {
    let mut store = FakeStore::new().with_fetch_delay(Duration::from_millis(10));
    for index in 0..10 {
        let username = format!("user{index:02}");
        store = store
            .with_user(&username)
            .with_item(&username, ActivityCategory::Skill, "s", Some(index));
    }
    let store = Arc::new(store);
    let config = FeedConfig {
        max_in_flight: 4,
        ..FeedConfig::default()
    };

    let report = ActivityFeed::with_config(Arc::clone(&store), config)
        .unwrap()
        .activity_feed_within(BUDGET)
        .await
        .unwrap();

    assert_eq!(report.items.len(), 10);
    assert!(report.issues.is_empty());
    assert_eq!(store.fetches(), 30);
    assert!(store.peak_in_flight() <= 4);
    assert!(store.peak_in_flight() >= 1);
}

#[tokio::test]
async fn unstamped_items_sort_last_and_are_reported() {
    let store = populated_store().with_item("u2", ActivityCategory::Objective, "draft", None);

    let report = run(store).await;

    let last = report.items.last().unwrap();
    assert_eq!(last.item_id(), "draft");
    assert_eq!(last.modified_at(), None);
    assert_eq!(report.items.len(), 6);

    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, FeedIssueKind::MissingTimestamp);
    assert_eq!(issue.item_id.as_deref(), Some("draft"));
    assert_eq!(report.unreadable_partitions(), 0);
}

#[tokio::test]
async fn undecodable_document_is_skipped_and_its_siblings_are_kept() {
    let store = populated_store().with_document(
        "u1",
        ActivityCategory::Skill,
        "no-title",
        json!({ "level": 2 }),
        Some(999),
    );

    let report = run(store).await;

    let ids: Vec<&str> = report.items.iter().map(|item| item.item_id()).collect();
    assert_eq!(ids, vec!["ship", "go", "feed", "cli", "rust"]);
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, FeedIssueKind::MalformedData);
    assert_eq!(issue.user.username, "u1");
    assert_eq!(issue.category, ActivityCategory::Skill);
    assert_eq!(issue.item_id.as_deref(), Some("no-title"));
    assert!(!issue.is_partition_failure());
    assert_eq!(report.unreadable_partitions(), 0);
}

#[tokio::test]
async fn every_undecodable_document_gets_its_own_issue() {
    let store = populated_store()
        .with_document(
            "u2",
            ActivityCategory::Skill,
            "bad-level",
            json!({ "title": "Zig", "level": 9 }),
            Some(260),
        )
        .with_document(
            "u2",
            ActivityCategory::Skill,
            "null-body",
            serde_json::Value::Null,
            Some(270),
        );

    let report = run(store).await;

    assert_eq!(report.items.len(), 5);
    let flagged: Vec<Option<&str>> = report
        .issues
        .iter()
        .map(|issue| issue.item_id.as_deref())
        .collect();
    assert_eq!(flagged, vec![Some("bad-level"), Some("null-body")]);
    assert!(report
        .issues
        .iter()
        .all(|issue| issue.kind == FeedIssueKind::MalformedData));
}

#[tokio::test]
async fn panicking_fetch_is_reported_as_aborted() {
    let report = run(populated_store().failing(
        "u2",
        ActivityCategory::Project,
        Failure::Panic,
    ))
    .await;

    let ids: Vec<&str> = report.items.iter().map(|item| item.item_id()).collect();
    assert_eq!(ids, vec!["ship", "go", "cli", "rust"]);

    let aborted: Vec<_> = report
        .issues
        .iter()
        .filter(|issue| issue.kind == FeedIssueKind::Aborted)
        .collect();
    assert_eq!(aborted.len(), 1);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(aborted[0].user.username, "u2");
    assert_eq!(aborted[0].category, ActivityCategory::Project);
    assert!(aborted[0].is_partition_failure());
}

#[tokio::test]
async fn user_activity_is_scoped_to_one_user() {
    let feed = ActivityFeed::new(Arc::new(populated_store()));
    let deadline = Instant::now() + BUDGET;

    let report = feed.user_activity("u2", deadline).await.unwrap();
    let ids: Vec<&str> = report.items.iter().map(|item| item.item_id()).collect();
    assert_eq!(ids, vec!["go", "feed"]);

    let err = feed.user_activity("nobody", deadline).await.unwrap_err();
    assert!(matches!(err, FeedError::UserNotFound(name) if name == "nobody"));
}

#[test]
fn zero_ceiling_is_rejected() {
    let config = FeedConfig {
        max_in_flight: 0,
        ..FeedConfig::default()
    };
    assert!(ActivityFeed::with_config(Arc::new(FakeStore::new()), config).is_err());
}

#[test]
fn accepted_config_is_kept_as_given() {
    let config = FeedConfig {
        max_in_flight: 4,
        default_deadline_ms: 750,
    };
    let feed = ActivityFeed::with_config(Arc::new(FakeStore::new()), config).unwrap();
    assert_eq!(*feed.config(), config);
    assert_eq!(feed.config().default_deadline(), Duration::from_millis(750));
    assert_eq!(ActivityFeed::new(Arc::new(FakeStore::new())).config().max_in_flight, 16);
}

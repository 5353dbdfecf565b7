//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the activity feed to Dart via FRB as flat, display-ready rows.
//! - Keep error semantics simple: an envelope with `ok` and a message.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Feed calls share one process-wide tokio runtime.

use devgate_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ActivityFeed, CategoryItem, FeedConfig, FeedIssue, FeedReport, SqliteRecordStore,
};
use log::error;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

const FEED_DEADLINE_MAX_MS: u64 = 30_000;
static FEED_RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One feed row ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItemRow {
    /// `skill|project|objective`.
    pub kind: String,
    pub item_id: String,
    pub username: String,
    /// Display name, falling back to the username.
    pub author: String,
    pub title: String,
    /// Category-specific one-liner (level, stack or status).
    pub detail: String,
    /// Epoch milliseconds; `None` when the item was never stamped.
    pub modified_at: Option<i64>,
}

/// One partial failure row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedIssueRow {
    pub username: String,
    pub kind: String,
    pub category: String,
    pub item_id: Option<String>,
}

/// Feed response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    /// `false` only when no feed could be produced at all.
    pub ok: bool,
    pub items: Vec<FeedItemRow>,
    pub issues: Vec<FeedIssueRow>,
    /// Partitions that could not be read, for a non-blocking notice.
    pub unreadable_partitions: u32,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl FeedResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            issues: Vec::new(),
            unreadable_partitions: 0,
            message: message.into(),
        }
    }
}

/// Builds the global activity feed from the database at `db_path`.
///
/// `deadline_ms` is clamped to `1..=30000`; `None` uses the default budget.
///
/// # FFI contract
/// - Sync call; blocks the calling isolate until the deadline at most.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn activity_feed(db_path: String, deadline_ms: Option<u64>) -> FeedResponse {
    let runtime = match feed_runtime() {
        Ok(runtime) => runtime,
        Err(message) => return FeedResponse::failure(message),
    };
    let store = match SqliteRecordStore::open(db_path.trim()) {
        Ok(store) => store,
        Err(err) => return FeedResponse::failure(format!("activity_feed failed: {err}")),
    };

    let config = FeedConfig::default();
    let budget = deadline_ms
        .map(|value| Duration::from_millis(value.clamp(1, FEED_DEADLINE_MAX_MS)))
        .unwrap_or_else(|| config.default_deadline());
    let feed = ActivityFeed::new(Arc::new(store));

    match runtime.block_on(feed.activity_feed_within(budget)) {
        Ok(report) => feed_response(report),
        Err(err) => {
            error!("event=ffi_call module=ffi status=error call=activity_feed error={err}");
            FeedResponse::failure(format!("activity_feed failed: {err}"))
        }
    }
}

fn feed_runtime() -> Result<&'static Runtime, String> {
    FEED_RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .enable_all()
            .thread_name("devgate-feed")
            .build()
            .map_err(|err| format!("failed to start feed runtime: {err}"))
    })
}

fn feed_response(report: FeedReport) -> FeedResponse {
    let unreadable = u32::try_from(report.unreadable_partitions()).unwrap_or(u32::MAX);
    let message = if unreadable == 0 {
        format!("{} activities", report.items.len())
    } else {
        format!(
            "{} activities; {unreadable} partitions could not be read",
            report.items.len()
        )
    };

    FeedResponse {
        ok: true,
        items: report
            .items
            .into_iter()
            .map(|item| FeedItemRow {
                kind: item.category().as_str().to_string(),
                item_id: item.item_id().to_string(),
                author: item.user.label().to_string(),
                title: item.item.title().to_string(),
                detail: item_detail(&item.item),
                modified_at: item.modified_at(),
                username: item.user.username,
            })
            .collect(),
        issues: report.issues.iter().map(issue_row).collect(),
        unreadable_partitions: unreadable,
        message,
    }
}

fn item_detail(item: &CategoryItem) -> String {
    match item {
        CategoryItem::Skill(skill) => format!("{:?}", skill.level),
        CategoryItem::Project(project) => project.stack.join(", "),
        CategoryItem::Objective(objective) => format!("{:?}", objective.status),
    }
}

fn issue_row(issue: &FeedIssue) -> FeedIssueRow {
    FeedIssueRow {
        username: issue.user.username.clone(),
        kind: issue.kind.as_str().to_string(),
        category: issue.category.as_str().to_string(),
        item_id: issue.item_id.clone(),
    }
}

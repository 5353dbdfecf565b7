//! Global recency ordering of collected feed entries.
//!
//! # Invariants
//! - Ordering is total: recency descending (unstamped last), then category,
//!   username and item id ascending.
//! - The result does not depend on the order batches arrive in.

use crate::feed::report::FeedIssue;
use crate::model::activity::ActivityItem;
use std::cmp::Ordering;

/// Flattens all batches and sorts them into the final feed.
pub fn merge_feed<I>(batches: I) -> Vec<ActivityItem>
where
    I: IntoIterator<Item = Vec<ActivityItem>>,
{
    let mut feed: Vec<ActivityItem> = batches.into_iter().flatten().collect();
    feed.sort_by(feed_order);
    feed
}

/// Total feed order.
pub fn feed_order(a: &ActivityItem, b: &ActivityItem) -> Ordering {
    recency_order(a.modified_at(), b.modified_at())
        .then_with(|| a.category().cmp(&b.category()))
        .then_with(|| a.user.username.cmp(&b.user.username))
        .then_with(|| a.item_id().cmp(b.item_id()))
}

/// Sorts issues by username, category, then item id (partition issues first).
pub fn sort_issues(issues: &mut [FeedIssue]) {
    issues.sort_by(|a, b| {
        a.user
            .username
            .cmp(&b.user.username)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}

fn recency_order(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

//! Single-partition retrieval.
//!
//! # Responsibility
//! - Read one (user, category) partition from the record store.
//! - Drop the sentinel and tag every real record with its owner.
//!
//! # Invariants
//! - Store failures are returned as partition-scoped `FeedIssue`s, never
//!   raised.
//! - An undecodable document is skipped and reported on its own; the rest of
//!   the partition is kept.
//! - Items without a recency timestamp are kept and reported.

use crate::feed::report::{FeedIssue, FeedIssueKind};
use crate::feed::sentinel::filter_sentinels;
use crate::model::activity::{ActivityCategory, ActivityItem, CategoryItem};
use crate::model::user::UserRef;
use crate::repo::record_store::RecordStore;

/// Tagged items of one partition plus item-scoped issues.
#[derive(Debug, Clone, Default)]
pub struct PartitionItems {
    pub items: Vec<ActivityItem>,
    pub issues: Vec<FeedIssue>,
}

/// Fetches, filters and tags one partition.
///
/// # Errors
/// Returns a partition-scoped issue when the store read fails. Documents that
/// cannot be decoded for `category` only produce item-scoped `MalformedData`
/// issues.
pub async fn fetch_partition<S>(
    store: &S,
    user: &UserRef,
    category: ActivityCategory,
) -> Result<PartitionItems, FeedIssue>
where
    S: RecordStore + ?Sized,
{
    let documents = store
        .list_category_items(&user.username, category)
        .await
        .map_err(|err| {
            FeedIssue::partition(user, category, FeedIssueKind::from(&err), err.to_string())
        })?;

    let mut partition = PartitionItems::default();
    for document in filter_sentinels(documents) {
        let item = match CategoryItem::decode(category, document) {
            Ok(item) => item,
            Err(err) => {
                partition.issues.push(FeedIssue::item(
                    user,
                    category,
                    err.item_id.as_str(),
                    FeedIssueKind::MalformedData,
                    err.to_string(),
                ));
                continue;
            }
        };

        if item.modified_at().is_none() {
            partition.issues.push(FeedIssue::item(
                user,
                category,
                item.id(),
                FeedIssueKind::MissingTimestamp,
                "item has no modified timestamp; ordered after stamped items",
            ));
        }
        partition
            .items
            .push(ActivityItem::new(user.clone(), item));
    }

    Ok(partition)
}

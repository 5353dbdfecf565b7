//! Concurrent fan-out over (user, category) partitions.
//!
//! # Responsibility
//! - Spawn one fetch task per partition and join them at a single barrier.
//! - Bound in-flight fetches with a semaphore.
//! - Stop waiting at the caller deadline and report what is still pending.
//!
//! # Invariants
//! - Each task owns exactly one result slot, keyed by its index in the
//!   partition list; slots are only read after the barrier.
//! - A task that panics leaves its slot empty and is reported as `Aborted`.
//! - A failed or unfinished partition never removes another partition's
//!   items.

use crate::feed::fetcher::{fetch_partition, PartitionItems};
use crate::feed::report::{FeedIssue, FeedIssueKind};
use crate::model::activity::{ActivityCategory, ActivityItem};
use crate::model::user::UserRef;
use crate::repo::record_store::RecordStore;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};

type SlotResult = Result<PartitionItems, FeedIssue>;

/// Everything collected by one fan-out pass, not yet ordered.
#[derive(Debug, Default)]
pub struct FanOutResult {
    /// One batch per successfully fetched partition.
    pub batches: Vec<Vec<ActivityItem>>,
    pub issues: Vec<FeedIssue>,
}

/// Fetches all `users × categories` partitions concurrently.
///
/// At most `max_in_flight` fetches hold a permit at once. Tasks still
/// running or queued at `deadline` are aborted and reported as `TimedOut`.
pub async fn fan_out<S>(
    store: Arc<S>,
    users: &[UserRef],
    max_in_flight: usize,
    deadline: Instant,
) -> FanOutResult
where
    S: RecordStore + ?Sized + 'static,
{
    let categories = ActivityCategory::ALL;
    let partitions: Vec<(&UserRef, ActivityCategory)> = users
        .iter()
        .flat_map(|user| categories.iter().map(move |category| (user, *category)))
        .collect();

    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut tasks = JoinSet::new();
    for (slot, (user, category)) in partitions.iter().enumerate() {
        let store = Arc::clone(&store);
        let semaphore = Arc::clone(&semaphore);
        let user = (*user).clone();
        let category = *category;
        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => fetch_partition(store.as_ref(), &user, category).await,
                Err(_) => Err(FeedIssue::partition(
                    &user,
                    category,
                    FeedIssueKind::Aborted,
                    "fetch pool closed before the partition was read",
                )),
            };
            (slot, outcome)
        });
    }

    let mut slots: Vec<Option<SlotResult>> = partitions.iter().map(|_| None).collect();
    let mut timed_out = false;
    let mut lost_tasks = 0usize;
    loop {
        match timeout_at(deadline, tasks.join_next()).await {
            Ok(Some(Ok((slot, outcome)))) => slots[slot] = Some(outcome),
            Ok(Some(Err(err))) => {
                // The slot index travels in the task output, so it is lost here;
                // the empty slot is labelled after the barrier.
                lost_tasks += 1;
                debug!("event=feed_fetch module=feed status=error error_code=task_failed error={err}");
            }
            Ok(None) => break,
            Err(_) => {
                timed_out = true;
                tasks.abort_all();
                break;
            }
        }
    }

    let mut result = FanOutResult::default();
    for ((user, category), slot) in partitions.into_iter().zip(slots) {
        match slot {
            Some(Ok(partition)) => {
                debug!(
                    "event=feed_fetch module=feed status=ok category={} items={}",
                    category,
                    partition.items.len()
                );
                result.batches.push(partition.items);
                result.issues.extend(partition.issues);
            }
            Some(Err(issue)) => {
                warn!(
                    "event=feed_fetch module=feed status=error category={} error_code={}",
                    category,
                    issue.kind.as_str()
                );
                result.issues.push(issue);
            }
            None if timed_out => result.issues.push(FeedIssue::partition(
                user,
                category,
                FeedIssueKind::TimedOut,
                "partition fetch did not finish before the deadline",
            )),
            None => {
                warn!(
                    "event=feed_fetch module=feed status=error category={} error_code={}",
                    category,
                    FeedIssueKind::Aborted.as_str()
                );
                result.issues.push(FeedIssue::partition(
                    user,
                    category,
                    FeedIssueKind::Aborted,
                    "partition fetch task stopped without a result",
                ));
            }
        }
    }
    if lost_tasks > 0 {
        warn!("event=feed_fan_out module=feed status=degraded lost_tasks={lost_tasks}");
    }

    result
}

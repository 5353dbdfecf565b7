//! Activity feed aggregation.
//!
//! # Responsibility
//! - Enumerate users and fan out partition reads across skills, projects and
//!   objectives.
//! - Merge every fetched record into one recency-ordered feed.
//! - Return partial failures next to the feed instead of failing the call.
//!
//! # Invariants
//! - Sentinel documents never reach the feed.
//! - Feed order is fully determined by the collected data, not by fetch
//!   completion order.
//! - Only user enumeration failures are terminal.

pub mod fetcher;
pub mod merge;
pub mod orchestrator;
pub mod report;
pub mod sentinel;

use crate::config::{ConfigError, FeedConfig};
use crate::feed::merge::{merge_feed, sort_issues};
use crate::feed::orchestrator::{fan_out, FanOutResult};
use crate::feed::report::{FeedError, FeedReport};
use crate::model::user::UserRef;
use crate::repo::record_store::RecordStore;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Feed aggregation engine over a shared record store.
pub struct ActivityFeed<S: RecordStore + ?Sized> {
    store: Arc<S>,
    config: FeedConfig,
}

impl<S: RecordStore + ?Sized + 'static> ActivityFeed<S> {
    /// Creates an engine with default settings.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: FeedConfig::default(),
        }
    }

    /// Creates an engine with validated custom settings.
    pub fn with_config(store: Arc<S>, config: FeedConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Settings this feed was validated with.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Builds the global activity feed.
    ///
    /// Fetches still pending at `deadline` are reported as timed out and the
    /// feed is built from whatever completed.
    ///
    /// # Errors
    /// - `FeedError::Enumeration` when listing users fails.
    /// - `FeedError::EnumerationTimedOut` when listing users outlives `deadline`.
    pub async fn activity_feed(&self, deadline: Instant) -> Result<FeedReport, FeedError> {
        let started_at = Instant::now();
        info!("event=feed_aggregate module=feed status=start scope=global");

        let users = match timeout_at(deadline, self.store.list_users()).await {
            Ok(Ok(users)) => users,
            Ok(Err(err)) => {
                error!(
                    "event=feed_aggregate module=feed status=error scope=global error_code=enumeration_failed error={}",
                    err
                );
                return Err(FeedError::Enumeration(err));
            }
            Err(_) => {
                error!(
                    "event=feed_aggregate module=feed status=error scope=global error_code=enumeration_timeout"
                );
                return Err(FeedError::EnumerationTimedOut);
            }
        };

        let report = self.collect(&users, deadline).await;
        info!(
            "event=feed_aggregate module=feed status=ok scope=global users={} items={} issues={} duration_ms={}",
            users.len(),
            report.items.len(),
            report.issues.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Builds the global feed within `budget` from now.
    pub async fn activity_feed_within(&self, budget: Duration) -> Result<FeedReport, FeedError> {
        self.activity_feed(Instant::now() + budget).await
    }

    /// Builds the global feed with the configured default deadline.
    pub async fn activity_feed_default(&self) -> Result<FeedReport, FeedError> {
        self.activity_feed_within(self.config.default_deadline()).await
    }

    /// Builds the feed of one user, e.g. for a profile timeline.
    ///
    /// # Errors
    /// - `FeedError::UserNotFound` when `username` has no partition.
    /// - `FeedError::Enumeration` when resolving the user fails.
    pub async fn user_activity(
        &self,
        username: &str,
        deadline: Instant,
    ) -> Result<FeedReport, FeedError> {
        let user = match timeout_at(deadline, self.store.get_user(username)).await {
            Ok(Ok(Some(user))) => user,
            Ok(Ok(None)) => return Err(FeedError::UserNotFound(username.to_string())),
            Ok(Err(err)) => return Err(FeedError::Enumeration(err)),
            Err(_) => return Err(FeedError::EnumerationTimedOut),
        };

        let report = self.collect(std::slice::from_ref(&user), deadline).await;
        info!(
            "event=feed_aggregate module=feed status=ok scope=user items={} issues={}",
            report.items.len(),
            report.issues.len()
        );
        Ok(report)
    }

    async fn collect(&self, users: &[UserRef], deadline: Instant) -> FeedReport {
        let FanOutResult { batches, mut issues } = fan_out(
            Arc::clone(&self.store),
            users,
            self.config.max_in_flight,
            deadline,
        )
        .await;

        sort_issues(&mut issues);
        FeedReport {
            items: merge_feed(batches),
            issues,
        }
    }
}

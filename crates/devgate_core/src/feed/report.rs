//! Feed result envelope and error taxonomy.
//!
//! # Invariants
//! - Only `FeedError` terminates an aggregation call; every per-partition or
//!   per-item problem is a `FeedIssue` returned next to the feed.
//! - Partition-scoped issues carry `item_id = None`.

use crate::model::activity::{ActivityCategory, ActivityItem};
use crate::model::user::UserRef;
use crate::repo::record_store::RepoError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a partition or item could not be fully represented in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedIssueKind {
    /// Store transport failure or store temporarily unable to serve.
    Unavailable,
    PermissionDenied,
    /// Stored rows could not be decoded for the category.
    MalformedData,
    /// The user disappeared between enumeration and fetch.
    UserNotFound,
    /// The deadline passed before the fetch completed.
    TimedOut,
    /// The fetch task stopped without producing a result.
    Aborted,
    /// Item kept in the feed but has no recency timestamp.
    MissingTimestamp,
}

impl FeedIssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::PermissionDenied => "permission_denied",
            Self::MalformedData => "malformed_data",
            Self::UserNotFound => "user_not_found",
            Self::TimedOut => "timed_out",
            Self::Aborted => "aborted",
            Self::MissingTimestamp => "missing_timestamp",
        }
    }
}

impl From<&RepoError> for FeedIssueKind {
    fn from(value: &RepoError) -> Self {
        match value {
            RepoError::PermissionDenied(_) => Self::PermissionDenied,
            RepoError::InvalidData(_) => Self::MalformedData,
            RepoError::UserNotFound(_) => Self::UserNotFound,
            RepoError::Db(_)
            | RepoError::Unavailable(_)
            | RepoError::ItemNotFound { .. }
            | RepoError::UsernameTaken(_) => Self::Unavailable,
        }
    }
}

/// One partial failure recorded during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedIssue {
    pub user: UserRef,
    pub category: ActivityCategory,
    /// Set for item-scoped issues only.
    pub item_id: Option<String>,
    pub kind: FeedIssueKind,
    pub message: String,
}

impl FeedIssue {
    /// Issue covering a whole (user, category) partition.
    pub fn partition(
        user: &UserRef,
        category: ActivityCategory,
        kind: FeedIssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user: user.clone(),
            category,
            item_id: None,
            kind,
            message: message.into(),
        }
    }

    /// Issue covering one item that is still part of the feed.
    pub fn item(
        user: &UserRef,
        category: ActivityCategory,
        item_id: impl Into<String>,
        kind: FeedIssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user: user.clone(),
            category,
            item_id: Some(item_id.into()),
            kind,
            message: message.into(),
        }
    }

    pub fn is_partition_failure(&self) -> bool {
        self.item_id.is_none()
    }
}

/// Best-effort feed plus every recorded partial failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedReport {
    /// Sorted by recency descending, then category, username and item id.
    pub items: Vec<ActivityItem>,
    /// Sorted by username, category and item id.
    pub issues: Vec<FeedIssue>,
}

impl FeedReport {
    /// Returns whether every partition was read and every item was stamped.
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of partitions missing from the feed, for a UI notice.
    pub fn unreadable_partitions(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.is_partition_failure())
            .count()
    }
}

/// Terminal aggregation failure: no feed can be produced.
#[derive(Debug)]
pub enum FeedError {
    /// Listing or resolving users failed.
    Enumeration(RepoError),
    /// The deadline passed before users could be listed.
    EnumerationTimedOut,
    UserNotFound(String),
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enumeration(err) => write!(f, "user enumeration failed: {err}"),
            Self::EnumerationTimedOut => write!(f, "user enumeration exceeded the deadline"),
            Self::UserNotFound(username) => write!(f, "user not found: {username}"),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Enumeration(err) => Some(err),
            Self::EnumerationTimedOut | Self::UserNotFound(_) => None,
        }
    }
}

impl From<RepoError> for FeedError {
    fn from(value: RepoError) -> Self {
        Self::Enumeration(value)
    }
}

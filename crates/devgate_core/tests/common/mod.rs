#![allow(dead_code)]

use async_trait::async_trait;
use devgate_core::{
    ActivityCategory, RecordStore, RepoError, RepoResult, StoredDocument, UserRef, SENTINEL_ID,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type PartitionKey = (String, ActivityCategory);

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Unavailable,
    PermissionDenied,
    /// The read crashes its task instead of returning an error.
    Panic,
}

/// In-memory record store with injectable failures and latency.
#[derive(Default)]
pub struct FakeStore {
    users: Vec<UserRef>,
    partitions: HashMap<PartitionKey, Vec<StoredDocument>>,
    failures: HashMap<PartitionKey, Failure>,
    hanging: HashSet<PartitionKey>,
    fetch_delay: Option<Duration>,
    enumeration_failure: bool,
    enumeration_hangs: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user whose three partitions hold only the sentinel.
    pub fn with_user(mut self, username: &str) -> Self {
        let mut user = UserRef::new(username);
        user.display_name = Some(format!("{username} display"));
        self.users.push(user);
        for category in ActivityCategory::ALL {
            self.partitions.insert(
                (username.to_string(), category),
                vec![StoredDocument {
                    id: SENTINEL_ID.to_string(),
                    body: json!({ "initialized": true }),
                    created_at: None,
                    modified_at: None,
                }],
            );
        }
        self
    }

    pub fn with_item(
        self,
        username: &str,
        category: ActivityCategory,
        item_id: &str,
        modified_at: Option<i64>,
    ) -> Self {
        let body = match category {
            ActivityCategory::Skill => json!({ "title": item_id, "level": 2 }),
            ActivityCategory::Project => json!({
                "title": item_id,
                "description": "side project",
                "stack": ["rust"],
                "githubLink": "https://github.com/example/repo",
            }),
            ActivityCategory::Objective => json!({ "title": item_id, "status": 1 }),
        };
        self.with_document(username, category, item_id, body, modified_at)
    }

    pub fn with_document(
        mut self,
        username: &str,
        category: ActivityCategory,
        item_id: &str,
        body: serde_json::Value,
        modified_at: Option<i64>,
    ) -> Self {
        self.partitions
            .entry((username.to_string(), category))
            .or_default()
            .push(StoredDocument {
                id: item_id.to_string(),
                body,
                created_at: modified_at,
                modified_at,
            });
        self
    }

    pub fn failing(mut self, username: &str, category: ActivityCategory, failure: Failure) -> Self {
        self.failures.insert((username.to_string(), category), failure);
        self
    }

    pub fn hanging(mut self, username: &str, category: ActivityCategory) -> Self {
        self.hanging.insert((username.to_string(), category));
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.enumeration_failure = true;
        self
    }

    pub fn hanging_enumeration(mut self) -> Self {
        self.enumeration_hangs = true;
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn list_users(&self) -> RepoResult<Vec<UserRef>> {
        if self.enumeration_hangs {
            std::future::pending::<()>().await;
        }
        if self.enumeration_failure {
            return Err(RepoError::Unavailable("users collection offline".to_string()));
        }
        Ok(self.users.clone())
    }

    async fn list_category_items(
        &self,
        username: &str,
        category: ActivityCategory,
    ) -> RepoResult<Vec<StoredDocument>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let key = (username.to_string(), category);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.hanging.contains(&key) {
            std::future::pending::<()>().await;
        }
        match self.failures.get(&key) {
            Some(Failure::Unavailable) => {
                return Err(RepoError::Unavailable("partition offline".to_string()))
            }
            Some(Failure::PermissionDenied) => {
                return Err(RepoError::PermissionDenied("rules rejected read".to_string()))
            }
            Some(Failure::Panic) => panic!("partition reader crashed"),
            None => {}
        }

        self.partitions
            .get(&key)
            .cloned()
            .ok_or_else(|| RepoError::UserNotFound(username.to_string()))
    }

    async fn get_user(&self, username: &str) -> RepoResult<Option<UserRef>> {
        Ok(self
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }
}

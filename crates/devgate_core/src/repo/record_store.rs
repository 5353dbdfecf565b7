//! Record store contracts.
//!
//! # Responsibility
//! - Define the async read gateway consumed by feed aggregation.
//! - Define the sync write contract consumed by profile use-cases.
//! - Provide one error type shared by every store implementation.
//!
//! # Invariants
//! - `list_category_items` returns the raw partition, sentinel included.
//! - Reads of an unknown user partition fail with `UserNotFound` instead of
//!   returning an empty list.

use crate::db::DbError;
use crate::model::activity::{ActivityCategory, StoredDocument};
use crate::model::user::UserRef;
use async_trait::async_trait;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for user and category item access.
#[derive(Debug)]
pub enum RepoError {
    /// Storage transport failure.
    Db(DbError),
    /// Store cannot serve requests right now (lock poisoned, worker lost).
    Unavailable(String),
    /// Store refused access to the requested data.
    PermissionDenied(String),
    UserNotFound(String),
    ItemNotFound {
        username: String,
        category: ActivityCategory,
        item_id: String,
    },
    UsernameTaken(String),
    /// Persisted rows do not match the expected shape.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "record store unavailable: {message}"),
            Self::PermissionDenied(message) => write!(f, "permission denied: {message}"),
            Self::UserNotFound(username) => write!(f, "user not found: {username}"),
            Self::ItemNotFound {
                username,
                category,
                item_id,
            } => write!(f, "{category} `{item_id}` not found for user {username}"),
            Self::UsernameTaken(username) => write!(f, "username already taken: {username}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(
                ErrorCode::PermissionDenied
                | ErrorCode::ReadOnly
                | ErrorCode::AuthorizationForStatementDenied,
            ) => Self::PermissionDenied(value.to_string()),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Read gateway over per-user partitions.
///
/// Implementations must be shareable across concurrently running fetches.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Enumerates every user partition. Order is unspecified.
    async fn list_users(&self) -> RepoResult<Vec<UserRef>>;

    /// Lists raw documents of one partition, sentinel included.
    async fn list_category_items(
        &self,
        username: &str,
        category: ActivityCategory,
    ) -> RepoResult<Vec<StoredDocument>>;

    /// Resolves one user's profile fields.
    async fn get_user(&self, username: &str) -> RepoResult<Option<UserRef>>;
}

/// Write contract for user registration and category items.
pub trait ProfileRepository {
    fn user_exists(&self, username: &str) -> RepoResult<bool>;

    /// Creates the user and one sentinel document per category atomically.
    fn create_user(&self, user: &UserRef) -> RepoResult<()>;

    fn insert_item(
        &self,
        username: &str,
        category: ActivityCategory,
        document: &StoredDocument,
    ) -> RepoResult<()>;

    /// Re-stamps `modified_at` of one real item.
    fn touch_item(
        &self,
        username: &str,
        category: ActivityCategory,
        item_id: &str,
        modified_at: i64,
    ) -> RepoResult<()>;
}

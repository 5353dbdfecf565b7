//! SQLite-backed record store.
//!
//! # Responsibility
//! - Serve async partition reads for the feed without blocking the runtime.
//! - Persist users, sentinels and category items for profile use-cases.
//!
//! # Invariants
//! - Every user row is created together with one sentinel per category.
//! - Sentinel rows are never updated by `touch_item`.
//! - A row whose body is not valid JSON is returned with a `null` body so the
//!   caller can report that one item; it never fails the whole listing.

use crate::db::{open_db, open_db_in_memory};
use crate::model::activity::{ActivityCategory, StoredDocument, SENTINEL_ID};
use crate::model::user::UserRef;
use crate::repo::record_store::{ProfileRepository, RecordStore, RepoError, RepoResult};
use async_trait::async_trait;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SENTINEL_BODY: &str = r#"{"initialized":true}"#;

/// Record store over one shared SQLite connection.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))?;
        op(&guard)
    }

    /// Runs a query on the blocking pool so async callers keep making progress.
    async fn run_blocking<T, F>(&self, op: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> RepoResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(op))
            .await
            .map_err(|err| RepoError::Unavailable(format!("blocking query task failed: {err}")))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn list_users(&self) -> RepoResult<Vec<UserRef>> {
        self.run_blocking(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, display_name, email, created_at
                 FROM users
                 ORDER BY username ASC;",
            )?;
            let mut rows = stmt.query([])?;
            let mut users = Vec::new();
            while let Some(row) = rows.next()? {
                users.push(parse_user_row(row)?);
            }
            Ok(users)
        })
        .await
    }

    async fn list_category_items(
        &self,
        username: &str,
        category: ActivityCategory,
    ) -> RepoResult<Vec<StoredDocument>> {
        let username = username.to_string();
        self.run_blocking(move |conn| {
            if !user_exists(conn, &username)? {
                return Err(RepoError::UserNotFound(username));
            }

            let mut stmt = conn.prepare(
                "SELECT item_id, body, created_at, modified_at
                 FROM category_items
                 WHERE username = ?1 AND category = ?2
                 ORDER BY modified_at DESC, item_id ASC;",
            )?;
            let mut rows = stmt.query(params![username, category.collection()])?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(parse_document_row(row, category)?);
            }
            Ok(documents)
        })
        .await
    }

    async fn get_user(&self, username: &str) -> RepoResult<Option<UserRef>> {
        let username = username.to_string();
        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT username, display_name, email, created_at
                 FROM users
                 WHERE username = ?1;",
            )?;
            let mut rows = stmt.query([username])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_user_row(row)?)),
                None => Ok(None),
            }
        })
        .await
    }
}

impl ProfileRepository for SqliteRecordStore {
    fn user_exists(&self, username: &str) -> RepoResult<bool> {
        self.with_conn(|conn| user_exists(conn, username))
    }

    fn create_user(&self, user: &UserRef) -> RepoResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))?;
        let tx = guard.transaction()?;

        if user_exists(&tx, &user.username)? {
            return Err(RepoError::UsernameTaken(user.username.clone()));
        }

        tx.execute(
            "INSERT INTO users (username, display_name, email, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.username.as_str(),
                user.display_name.as_deref(),
                user.email.as_deref(),
                user.created_at,
            ],
        )?;
        for category in ActivityCategory::ALL {
            tx.execute(
                "INSERT INTO category_items (username, category, item_id, body)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    user.username.as_str(),
                    category.collection(),
                    SENTINEL_ID,
                    SENTINEL_BODY
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_item(
        &self,
        username: &str,
        category: ActivityCategory,
        document: &StoredDocument,
    ) -> RepoResult<()> {
        if document.is_sentinel() {
            return Err(RepoError::InvalidData(format!(
                "item id `{SENTINEL_ID}` is reserved"
            )));
        }
        let body = serde_json::to_string(&document.body)
            .map_err(|err| RepoError::InvalidData(format!("unserializable body: {err}")))?;

        self.with_conn(|conn| {
            if !user_exists(conn, username)? {
                return Err(RepoError::UserNotFound(username.to_string()));
            }
            conn.execute(
                "INSERT INTO category_items (
                    username, category, item_id, body, created_at, modified_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    username,
                    category.collection(),
                    document.id.as_str(),
                    body,
                    document.created_at,
                    document.modified_at,
                ],
            )?;
            Ok(())
        })
    }

    fn touch_item(
        &self,
        username: &str,
        category: ActivityCategory,
        item_id: &str,
        modified_at: i64,
    ) -> RepoResult<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE category_items
                 SET modified_at = ?1
                 WHERE username = ?2 AND category = ?3 AND item_id = ?4 AND item_id <> ?5;",
                params![
                    modified_at,
                    username,
                    category.collection(),
                    item_id,
                    SENTINEL_ID
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::ItemNotFound {
                    username: username.to_string(),
                    category,
                    item_id: item_id.to_string(),
                });
            }
            Ok(())
        })
    }
}

fn user_exists(conn: &Connection, username: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM users WHERE username = ?1;",
            [username],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserRef> {
    Ok(UserRef {
        username: row.get("username")?,
        display_name: row.get("display_name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_document_row(row: &Row<'_>, category: ActivityCategory) -> RepoResult<StoredDocument> {
    let id: String = row.get("item_id")?;
    let body_text: String = row.get("body")?;
    let body = serde_json::from_str(&body_text).unwrap_or_else(|err| {
        warn!(
            "event=row_decode module=repo status=error category={} item_id={id} error={err}",
            category.collection()
        );
        serde_json::Value::Null
    });

    Ok(StoredDocument {
        id,
        body,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    })
}

//! User partition reference.
//!
//! # Invariants
//! - `username` is globally unique and is the partition key for every
//!   category item owned by the user.
//! - Profile fields are denormalized copies and may be absent.

use serde::{Deserialize, Serialize};

/// A user as seen by the feed: partition key plus display profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: Option<i64>,
}

impl UserRef {
    /// Creates a reference carrying only the partition key.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: None,
            email: None,
            created_at: None,
        }
    }

    /// Name to show in a feed row, falling back to the username.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.username.as_str())
    }
}

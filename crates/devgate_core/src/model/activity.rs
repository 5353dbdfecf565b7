//! Category items and feed entries.
//!
//! # Responsibility
//! - Define the closed set of activity categories and their typed records.
//! - Decode raw stored documents into typed records per category.
//!
//! # Invariants
//! - A document whose id equals [`SENTINEL_ID`] is a storage placeholder and
//!   is never decoded into a [`CategoryItem`].
//! - Timestamps are Unix epoch milliseconds; `None` means not yet stamped.

use crate::model::user::UserRef;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reserved id of the placeholder document present in every partition.
pub const SENTINEL_ID: &str = "init";

/// Closed set of per-user sub-resources that produce feed activity.
///
/// Declaration order is the tie-break order used by the feed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Skill,
    Project,
    Objective,
}

impl ActivityCategory {
    /// Every category, in tie-break order.
    pub const ALL: [ActivityCategory; 3] = [Self::Skill, Self::Project, Self::Objective];

    /// Stable tag used in logs and FFI rows.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Project => "project",
            Self::Objective => "objective",
        }
    }

    /// Storage collection name of the partition.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Skill => "skills",
            Self::Project => "projects",
            Self::Objective => "objectives",
        }
    }

    pub fn from_collection(value: &str) -> Option<Self> {
        match value {
            "skills" => Some(Self::Skill),
            "projects" => Some(Self::Project),
            "objectives" => Some(Self::Objective),
            _ => None,
        }
    }
}

impl Display for ActivityCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-assessed skill level, stored as `1..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SkillLevel {
    Beginner = 1,
    Intermediate = 2,
    Expert = 3,
}

impl TryFrom<u8> for SkillLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Beginner),
            2 => Ok(Self::Intermediate),
            3 => Ok(Self::Expert),
            other => Err(format!("skill level must be 1..=3, got {other}")),
        }
    }
}

impl From<SkillLevel> for u8 {
    fn from(value: SkillLevel) -> Self {
        value as u8
    }
}

/// Objective progress, stored as `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ObjectiveStatus {
    #[default]
    Open = 0,
    InProgress = 1,
    Achieved = 2,
}

impl TryFrom<u8> for ObjectiveStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Open),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Achieved),
            other => Err(format!("objective status must be 0..=2, got {other}")),
        }
    }
}

impl From<ObjectiveStatus> for u8 {
    fn from(value: ObjectiveStatus) -> Self {
        value as u8
    }
}

/// Raw document as returned by the record store, sentinel included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    /// Category-specific fields.
    pub body: serde_json::Value,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
}

impl StoredDocument {
    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_ID
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub title: String,
    pub level: SkillLevel,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Normalized technology tags: lowercase, unique.
    pub stack: Vec<String>,
    pub github_link: String,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub title: String,
    pub status: ObjectiveStatus,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
}

/// Stored JSON body of a skill document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SkillBody {
    pub title: String,
    pub level: SkillLevel,
}

/// Stored JSON body of a project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectBody {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub stack: Vec<String>,
    #[serde(default)]
    pub github_link: String,
}

/// Stored JSON body of an objective document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ObjectiveBody {
    pub title: String,
    #[serde(default)]
    pub status: ObjectiveStatus,
}

/// A stored document could not be read as a record of its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDecodeError {
    pub category: ActivityCategory,
    pub item_id: String,
    pub message: String,
}

impl Display for ItemDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "malformed {} document `{}`: {}",
            self.category, self.item_id, self.message
        )
    }
}

impl Error for ItemDecodeError {}

/// One real record of a category partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CategoryItem {
    Skill(Skill),
    Project(Project),
    Objective(Objective),
}

impl CategoryItem {
    /// Decodes a stored document as a record of `category`.
    ///
    /// Callers are expected to drop sentinels first; a sentinel body does not
    /// carry the category fields and is rejected here. A `null` body stands
    /// for stored text that was not valid JSON.
    pub fn decode(
        category: ActivityCategory,
        document: StoredDocument,
    ) -> Result<Self, ItemDecodeError> {
        let StoredDocument {
            id,
            body,
            created_at,
            modified_at,
        } = document;
        let malformed = |id: &str, err: serde_json::Error| ItemDecodeError {
            category,
            item_id: id.to_string(),
            message: err.to_string(),
        };
        if body.is_null() {
            return Err(ItemDecodeError {
                category,
                item_id: id,
                message: "document body is missing or not valid JSON".to_string(),
            });
        }

        let item = match category {
            ActivityCategory::Skill => {
                let body: SkillBody =
                    serde_json::from_value(body).map_err(|err| malformed(&id, err))?;
                Self::Skill(Skill {
                    id,
                    title: body.title,
                    level: body.level,
                    created_at,
                    modified_at,
                })
            }
            ActivityCategory::Project => {
                let body: ProjectBody =
                    serde_json::from_value(body).map_err(|err| malformed(&id, err))?;
                Self::Project(Project {
                    id,
                    title: body.title,
                    description: body.description,
                    stack: body.stack,
                    github_link: body.github_link,
                    created_at,
                    modified_at,
                })
            }
            ActivityCategory::Objective => {
                let body: ObjectiveBody =
                    serde_json::from_value(body).map_err(|err| malformed(&id, err))?;
                Self::Objective(Objective {
                    id,
                    title: body.title,
                    status: body.status,
                    created_at,
                    modified_at,
                })
            }
        };
        Ok(item)
    }

    pub fn category(&self) -> ActivityCategory {
        match self {
            Self::Skill(_) => ActivityCategory::Skill,
            Self::Project(_) => ActivityCategory::Project,
            Self::Objective(_) => ActivityCategory::Objective,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Skill(skill) => &skill.id,
            Self::Project(project) => &project.id,
            Self::Objective(objective) => &objective.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Skill(skill) => &skill.title,
            Self::Project(project) => &project.title,
            Self::Objective(objective) => &objective.title,
        }
    }

    pub fn modified_at(&self) -> Option<i64> {
        match self {
            Self::Skill(skill) => skill.modified_at,
            Self::Project(project) => project.modified_at,
            Self::Objective(objective) => objective.modified_at,
        }
    }
}

/// Feed entry: one category item tagged with its owner.
///
/// Built fresh by each aggregation pass and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub user: UserRef,
    pub item: CategoryItem,
}

impl ActivityItem {
    pub fn new(user: UserRef, item: CategoryItem) -> Self {
        Self { user, item }
    }

    pub fn category(&self) -> ActivityCategory {
        self.item.category()
    }

    pub fn item_id(&self) -> &str {
        self.item.id()
    }

    /// Recency timestamp used as the primary feed sort key.
    pub fn modified_at(&self) -> Option<i64> {
        self.item.modified_at()
    }
}

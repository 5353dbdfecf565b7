//! Profile use-case service.
//!
//! # Responsibility
//! - Register users together with their partition sentinels.
//! - Validate and persist skill, project and objective records.
//! - Stamp `created_at`/`modified_at` on the server side.
//!
//! # Invariants
//! - Usernames match `^[A-Za-z0-9_.-]{3,32}$` and are never reused.
//! - Project stacks are trimmed, lowercased and deduplicated in first-seen
//!   order.
//! - Every write names its user explicitly; there is no ambient user.

use crate::model::activity::{
    ActivityCategory, Objective, ObjectiveBody, ObjectiveStatus, Project, ProjectBody, Skill,
    SkillBody, SkillLevel, StoredDocument,
};
use crate::model::user::UserRef;
use crate::repo::record_store::{ProfileRepository, RepoError};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Service error for profile use-cases.
#[derive(Debug)]
pub enum ProfileError {
    InvalidUsername(String),
    InvalidEmail(String),
    /// A required form field is missing or out of range.
    InvalidField {
        field: &'static str,
        message: String,
    },
    UsernameTaken(String),
    UserNotFound(String),
    ItemNotFound {
        category: ActivityCategory,
        item_id: String,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid email: `{value}`"),
            Self::InvalidField { field, message } => write!(f, "invalid {field}: {message}"),
            Self::UsernameTaken(value) => write!(f, "username already taken: {value}"),
            Self::UserNotFound(value) => write!(f, "user not found: {value}"),
            Self::ItemNotFound { category, item_id } => {
                write!(f, "{category} not found: {item_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProfileError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UsernameTaken(username) => Self::UsernameTaken(username),
            RepoError::UserNotFound(username) => Self::UserNotFound(username),
            RepoError::ItemNotFound {
                category, item_id, ..
            } => Self::ItemNotFound { category, item_id },
            other => Self::Repo(other),
        }
    }
}

/// Registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Skill form. `level` is `1..=3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSkill {
    pub title: String,
    pub level: u8,
}

/// Project form. `stack` is comma-separated free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub stack: String,
    pub github_link: String,
}

/// Objective form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewObjective {
    pub title: String,
    pub status: ObjectiveStatus,
}

/// Profile service facade over repository implementations.
pub struct ProfileService<R: ProfileRepository> {
    repo: R,
    clock: fn() -> i64,
}

impl<R: ProfileRepository> ProfileService<R> {
    /// Creates a service stamping records with the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, now_epoch_ms)
    }

    /// Creates a service with a custom epoch-millisecond clock.
    pub fn with_clock(repo: R, clock: fn() -> i64) -> Self {
        Self { repo, clock }
    }

    pub fn username_available(&self, username: &str) -> Result<bool, ProfileError> {
        let username = username.trim();
        if !USERNAME_RE.is_match(username) {
            return Err(ProfileError::InvalidUsername(username.to_string()));
        }
        Ok(!self.repo.user_exists(username)?)
    }

    /// Registers a user and seeds the three partition sentinels.
    pub fn register_user(&self, request: &NewUser) -> Result<UserRef, ProfileError> {
        let username = request.username.trim();
        if !USERNAME_RE.is_match(username) {
            return Err(ProfileError::InvalidUsername(username.to_string()));
        }
        let email = request.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(ProfileError::InvalidEmail(email.to_string()));
        }

        let user = UserRef {
            username: username.to_string(),
            display_name: request
                .display_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            email: Some(email.to_string()),
            created_at: Some((self.clock)()),
        };
        self.repo.create_user(&user)?;
        info!("event=user_register module=profile status=ok");
        Ok(user)
    }

    pub fn add_skill(&self, username: &str, request: &NewSkill) -> Result<Skill, ProfileError> {
        let title = required("title", &request.title)?;
        let level = SkillLevel::try_from(request.level).map_err(|message| {
            ProfileError::InvalidField {
                field: "level",
                message,
            }
        })?;

        let body = SkillBody {
            title: title.clone(),
            level,
        };
        let document = self.persist(username, ActivityCategory::Skill, &body)?;
        Ok(Skill {
            id: document.id,
            title,
            level,
            created_at: document.created_at,
            modified_at: document.modified_at,
        })
    }

    pub fn add_project(
        &self,
        username: &str,
        request: &NewProject,
    ) -> Result<Project, ProfileError> {
        let title = required("title", &request.title)?;
        let description = required("description", &request.description)?;
        let github_link = required("github_link", &request.github_link)?;
        let stack = normalize_stack(&request.stack);
        if stack.is_empty() {
            return Err(ProfileError::InvalidField {
                field: "stack",
                message: "at least one technology is required".to_string(),
            });
        }

        let body = ProjectBody {
            title: title.clone(),
            description: description.clone(),
            stack: stack.clone(),
            github_link: github_link.clone(),
        };
        let document = self.persist(username, ActivityCategory::Project, &body)?;
        Ok(Project {
            id: document.id,
            title,
            description,
            stack,
            github_link,
            created_at: document.created_at,
            modified_at: document.modified_at,
        })
    }

    pub fn add_objective(
        &self,
        username: &str,
        request: &NewObjective,
    ) -> Result<Objective, ProfileError> {
        let title = required("title", &request.title)?;
        let body = ObjectiveBody {
            title: title.clone(),
            status: request.status,
        };
        let document = self.persist(username, ActivityCategory::Objective, &body)?;
        Ok(Objective {
            id: document.id,
            title,
            status: request.status,
            created_at: document.created_at,
            modified_at: document.modified_at,
        })
    }

    /// Marks an item as updated now, moving it to the top of the feed.
    ///
    /// Returns the new `modified_at`.
    pub fn touch_item(
        &self,
        username: &str,
        category: ActivityCategory,
        item_id: &str,
    ) -> Result<i64, ProfileError> {
        let now = (self.clock)();
        self.repo.touch_item(username, category, item_id, now)?;
        Ok(now)
    }

    fn persist<B: serde::Serialize>(
        &self,
        username: &str,
        category: ActivityCategory,
        body: &B,
    ) -> Result<StoredDocument, ProfileError> {
        let body = serde_json::to_value(body).map_err(|err| {
            ProfileError::Repo(RepoError::InvalidData(format!(
                "cannot serialize {category} body: {err}"
            )))
        })?;
        let now = (self.clock)();
        let document = StoredDocument {
            id: Uuid::new_v4().to_string(),
            body,
            created_at: Some(now),
            modified_at: Some(now),
        };
        self.repo.insert_item(username.trim(), category, &document)?;
        info!(
            "event=item_create module=profile status=ok category={}",
            category
        );
        Ok(document)
    }
}

/// Splits, trims, lowercases and deduplicates a comma-separated stack.
pub fn normalize_stack(raw: &str) -> Vec<String> {
    let mut stack: Vec<String> = Vec::new();
    for tech in raw.split(',') {
        let normalized = tech.trim().to_lowercase();
        if !normalized.is_empty() && !stack.contains(&normalized) {
            stack.push(normalized);
        }
    }
    stack
}

fn required(field: &'static str, value: &str) -> Result<String, ProfileError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProfileError::InvalidField {
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

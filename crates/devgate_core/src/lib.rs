//! Core domain logic for DevGate.
//! Aggregates per-user skills, projects and objectives into one activity feed.

pub mod config;
pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, FeedConfig};
pub use feed::report::{FeedError, FeedIssue, FeedIssueKind, FeedReport};
pub use feed::ActivityFeed;
pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, LogOptions, LoggingError,
};
pub use model::activity::{
    ActivityCategory, ActivityItem, CategoryItem, Objective, ObjectiveStatus, Project, Skill,
    SkillLevel, StoredDocument, SENTINEL_ID,
};
pub use model::user::UserRef;
pub use repo::record_store::{ProfileRepository, RecordStore, RepoError, RepoResult};
pub use repo::sqlite_store::SqliteRecordStore;
pub use service::profile_service::{
    NewObjective, NewProject, NewSkill, NewUser, ProfileError, ProfileService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

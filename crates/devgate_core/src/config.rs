//! Feed aggregation settings.
//!
//! # Invariants
//! - `max_in_flight` and `default_deadline_ms` are both non-zero after
//!   `validate()` succeeds.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_MAX_IN_FLIGHT: usize = 16;
const DEFAULT_DEADLINE_MS: u64 = 5_000;

/// Invalid feed setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroMaxInFlight,
    ZeroDeadline,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroMaxInFlight => write!(f, "max_in_flight must be at least 1"),
            Self::ZeroDeadline => write!(f, "default_deadline_ms must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

/// Tuning knobs for one `ActivityFeed` instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Upper bound on partition fetches running at the same time.
    pub max_in_flight: usize,
    /// Time budget used when the caller does not pass a deadline.
    pub default_deadline_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            default_deadline_ms: DEFAULT_DEADLINE_MS,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight == 0 {
            return Err(ConfigError::ZeroMaxInFlight);
        }
        if self.default_deadline_ms == 0 {
            return Err(ConfigError::ZeroDeadline);
        }
        Ok(())
    }

    pub fn default_deadline(&self) -> Duration {
        Duration::from_millis(self.default_deadline_ms)
    }
}

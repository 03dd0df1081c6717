//! Project Record - a named collection of runs on the tracking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project path of the unmodulated sequential benchmark.
pub const BASELINE_PROJECT: &str = "meta-learning-scaling/sequential-benchmark-baseline";

/// Project path of the query-modulated sequential benchmark.
pub const MODULATED_PROJECT: &str = "meta-learning-scaling/sequential-benchmark-task-modulated";

/// Project Record identifies a project by its `entity/project` path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRecord {
    path: String,
    created_at: DateTime<Utc>,
    config: Option<serde_json::Value>,
}

impl ProjectRecord {
    /// Create a project record for an `entity/project` path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            created_at: Utc::now(),
            config: None,
        }
    }

    /// Attach project-level configuration.
    #[must_use]
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Full `entity/project` path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Entity (owner) part of the path.
    #[must_use]
    pub fn entity(&self) -> &str {
        self.path.split_once('/').map_or("", |(entity, _)| entity)
    }

    /// Project name part of the path.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.split_once('/').map_or(self.path.as_str(), |(_, name)| name)
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the project configuration, if any.
    #[must_use]
    pub const fn config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }
}

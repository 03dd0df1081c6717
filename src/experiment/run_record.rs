//! Run Record - one sequential-task training run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RunDescriptor;

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is still training.
    Running,
    /// Run trained through every task.
    Finished,
    /// Run crashed before the last task.
    Crashed,
}

/// Run Record represents a single training run of a project.
///
/// The record carries the task introduction order (`query_order`, task
/// identities in the order they were added) and the structured
/// replication identifier. The accuracy history is fetched separately
/// through a [`super::RunSource`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    name: String,
    project: String,
    description: String,
    query_order: Vec<usize>,
    descriptor: Option<RunDescriptor>,
    status: RunStatus,
    created_at: DateTime<Utc>,
}

impl RunRecord {
    /// Create a finished run record with an empty query order.
    ///
    /// # Arguments
    ///
    /// * `run_id` - Unique identifier of the run within the tracking service
    /// * `project` - Project path (`entity/project`)
    #[must_use]
    pub fn new(run_id: impl Into<String>, project: impl Into<String>) -> Self {
        let run_id = run_id.into();
        Self {
            name: run_id.clone(),
            run_id,
            project: project.into(),
            description: String::new(),
            query_order: Vec::new(),
            descriptor: None,
            status: RunStatus::Finished,
            created_at: Utc::now(),
        }
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(run_id: impl Into<String>, project: impl Into<String>) -> RunRecordBuilder {
        RunRecordBuilder::new(run_id, project)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the display name (matched against ignore-lists).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the project path.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Get the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Task identities in the order they were introduced.
    #[must_use]
    pub fn query_order(&self) -> &[usize] {
        &self.query_order
    }

    /// Structured replication identifier, if known.
    #[must_use]
    pub const fn descriptor(&self) -> Option<RunDescriptor> {
        self.descriptor
    }

    /// Get the run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Decode the descriptor from the description if it is not set yet.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRunDescriptor` if the description carries no identifier.
    pub fn resolve_descriptor(&mut self) -> crate::Result<RunDescriptor> {
        if let Some(descriptor) = self.descriptor {
            return Ok(descriptor);
        }
        let descriptor = RunDescriptor::parse(&self.description)?;
        self.descriptor = Some(descriptor);
        Ok(descriptor)
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
pub struct RunRecordBuilder {
    record: RunRecord,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(run_id: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            record: RunRecord::new(run_id, project),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.record.name = name.into();
        self
    }

    /// Set the free-text description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.record.description = description.into();
        self
    }

    /// Set the task introduction order.
    #[must_use]
    pub fn query_order(mut self, order: impl Into<Vec<usize>>) -> Self {
        self.record.query_order = order.into();
        self
    }

    /// Set the structured replication identifier.
    #[must_use]
    pub const fn descriptor(mut self, descriptor: RunDescriptor) -> Self {
        self.record.descriptor = Some(descriptor);
        self
    }

    /// Set the run status.
    #[must_use]
    pub const fn status(mut self, status: RunStatus) -> Self {
        self.record.status = status;
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.record.created_at = created_at;
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        self.record
    }
}

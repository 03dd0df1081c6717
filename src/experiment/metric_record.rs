//! Metric Record - one logged point of a run's accuracy history

use serde::{Deserialize, Serialize};

/// Metric Record is a single `(step, key, value)` sample of a run.
///
/// Samples with the same `run_id` and `key` form one column of the run
/// history; `step` orders them. A step at which a key was not logged is
/// a gap in that column (before a task is introduced, for instance).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    run_id: String,
    key: String,
    step: u64,
    value: f64,
}

impl MetricRecord {
    /// Create a new metric record.
    ///
    /// # Arguments
    ///
    /// * `run_id` - ID of the parent run
    /// * `key` - Column name (e.g., `"Test Accuracy, Query #3"`)
    /// * `step` - Logging step
    /// * `value` - Logged value
    #[must_use]
    pub fn new(run_id: impl Into<String>, key: impl Into<String>, step: u64, value: f64) -> Self {
        Self {
            run_id: run_id.into(),
            key: key.into(),
            step,
            value,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the metric key/name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the logging step.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }
}

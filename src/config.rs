//! Analysis configuration
//!
//! Shape, threshold and epoch size of a sequential benchmark. Defaults
//! match the ten-task CLEVR-style benchmark (30 task identities, 22500
//! examples per epoch, 0.95 accuracy criterion).

use serde::{Deserialize, Serialize};

/// Number of sequentially introduced tasks per run.
pub const DEFAULT_NUM_TASKS: usize = 10;

/// Accuracy a task must exceed to count as learned.
pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 0.95;

/// Training examples in one epoch of the coreset.
pub const DEFAULT_EXAMPLES_PER_EPOCH: u64 = 22_500;

/// Distinct task identities a run may draw its query order from.
pub const DEFAULT_NUM_TASK_IDENTITIES: usize = 30;

/// Column name prefix of the per-task test accuracy series.
pub const DEFAULT_ACCURACY_COLUMN_PREFIX: &str = "Test Accuracy, Query #";

/// Configuration passed to the run parser and aggregator.
///
/// Deserialization goes through [`AnalysisConfigBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedConfig")]
pub struct AnalysisConfig {
    num_tasks: usize,
    accuracy_threshold: f64,
    examples_per_epoch: u64,
    num_task_identities: usize,
    accuracy_column_prefix: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            num_tasks: DEFAULT_NUM_TASKS,
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD,
            examples_per_epoch: DEFAULT_EXAMPLES_PER_EPOCH,
            num_task_identities: DEFAULT_NUM_TASK_IDENTITIES,
            accuracy_column_prefix: DEFAULT_ACCURACY_COLUMN_PREFIX.to_string(),
        }
    }
}

/// Deserialized fields before validation; absent fields take the defaults.
#[derive(Deserialize)]
#[serde(default)]
struct UncheckedConfig {
    num_tasks: usize,
    accuracy_threshold: f64,
    examples_per_epoch: u64,
    num_task_identities: usize,
    accuracy_column_prefix: String,
}

impl Default for UncheckedConfig {
    fn default() -> Self {
        let config = AnalysisConfig::default();
        Self {
            num_tasks: config.num_tasks,
            accuracy_threshold: config.accuracy_threshold,
            examples_per_epoch: config.examples_per_epoch,
            num_task_identities: config.num_task_identities,
            accuracy_column_prefix: config.accuracy_column_prefix,
        }
    }
}

impl TryFrom<UncheckedConfig> for AnalysisConfig {
    type Error = crate::Error;

    fn try_from(raw: UncheckedConfig) -> crate::Result<Self> {
        Self::builder()
            .num_tasks(raw.num_tasks)
            .accuracy_threshold(raw.accuracy_threshold)
            .examples_per_epoch(raw.examples_per_epoch)
            .num_task_identities(raw.num_task_identities)
            .accuracy_column_prefix(raw.accuracy_column_prefix)
            .build()
    }
}

impl AnalysisConfig {
    /// Create the default ten-task configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Number of sequentially introduced tasks.
    #[must_use]
    pub const fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    /// Accuracy criterion (strictly exceeded).
    #[must_use]
    pub const fn accuracy_threshold(&self) -> f64 {
        self.accuracy_threshold
    }

    /// Examples in one epoch of a newly introduced task.
    #[must_use]
    pub const fn examples_per_epoch_base(&self) -> u64 {
        self.examples_per_epoch
    }

    /// Number of rows of the task-identity accumulator.
    #[must_use]
    pub const fn num_task_identities(&self) -> usize {
        self.num_task_identities
    }

    /// Name of the accuracy column for a 1-based task slot.
    #[must_use]
    pub fn accuracy_column(&self, task: usize) -> String {
        format!("{}{task}", self.accuracy_column_prefix)
    }

    /// All accuracy column names, in task order.
    #[must_use]
    pub fn accuracy_columns(&self) -> Vec<String> {
        (1..=self.num_tasks).map(|task| self.accuracy_column(task)).collect()
    }

    /// Examples seen per epoch by `task` while `latest_task` is the newest one.
    ///
    /// The newest task gets the whole epoch; earlier tasks share it evenly
    /// (integer division) during interleaved review.
    #[must_use]
    pub fn examples_per_epoch(&self, task: usize, latest_task: usize) -> u64 {
        if task == latest_task || latest_task <= 1 {
            return self.examples_per_epoch;
        }
        self.examples_per_epoch / (latest_task as u64 - 1)
    }
}

/// Builder for `AnalysisConfig`.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    /// Set the number of sequential tasks.
    #[must_use]
    pub const fn num_tasks(mut self, num_tasks: usize) -> Self {
        self.config.num_tasks = num_tasks;
        self
    }

    /// Set the accuracy criterion.
    #[must_use]
    pub const fn accuracy_threshold(mut self, threshold: f64) -> Self {
        self.config.accuracy_threshold = threshold;
        self
    }

    /// Set the examples in one epoch of a new task.
    #[must_use]
    pub const fn examples_per_epoch(mut self, examples: u64) -> Self {
        self.config.examples_per_epoch = examples;
        self
    }

    /// Set the number of task identities.
    #[must_use]
    pub const fn num_task_identities(mut self, identities: usize) -> Self {
        self.config.num_task_identities = identities;
        self
    }

    /// Set the accuracy column prefix.
    #[must_use]
    pub fn accuracy_column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.accuracy_column_prefix = prefix.into();
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if there are fewer than two tasks or the
    /// threshold is not a finite number.
    pub fn build(self) -> crate::Result<AnalysisConfig> {
        if self.config.num_tasks < 2 {
            return Err(crate::Error::InvalidInput(format!(
                "num_tasks must be at least 2, got {}",
                self.config.num_tasks
            )));
        }
        if !self.config.accuracy_threshold.is_finite() {
            return Err(crate::Error::InvalidInput(
                "accuracy_threshold must be finite".to_string(),
            ));
        }
        Ok(self.config)
    }
}

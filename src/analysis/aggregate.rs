//! Aggregator - statistics over many runs
//!
//! Every run is parsed into its criterion matrices, the matrices are
//! stacked, and each cell gets a mean and a population standard
//! deviation. Examples to criterion are also folded into a
//! task-identity accumulator, which uses its own indexing: row = task
//! identity from the run's `query_order`, column = times trained minus
//! one. The two layouts are deliberately not interchangeable.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::parser::{RunMatrices, RunParser};
use crate::config::AnalysisConfig;
use crate::experiment::{RunRecord, RunSource};
use crate::matrix::CriterionMatrix;
use crate::{Error, Result};

/// Names of the four result sets, in [`AnalysisField`] order.
pub const RESULT_SET_NAMES: [&str; 4] = [
    "Examples to criterion",
    "Log examples to criterion",
    "New task accuracy",
    "New task accuracy delta",
];

/// A named `(mean, std)` summary over many runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Display name (also used as default axis label)
    pub name: String,
    /// Cell-wise mean
    pub mean: CriterionMatrix,
    /// Cell-wise population standard deviation
    pub std: CriterionMatrix,
}

impl ResultSet {
    /// Summarise a stack of same-shaped matrices.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the stack is empty or shapes differ.
    pub fn from_stack(name: impl Into<String>, stack: &[CriterionMatrix]) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            mean: CriterionMatrix::mean(stack)?,
            std: CriterionMatrix::std(stack)?,
        })
    }

    /// Whether the summary is over log-scaled values.
    #[must_use]
    pub fn is_log(&self) -> bool {
        self.name.to_lowercase().contains("log")
    }
}

/// Selects one of the four result sets of an [`AnalysisSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisField {
    /// Examples to criterion
    Examples,
    /// Natural log of examples to criterion
    LogExamples,
    /// Accuracy at task switch
    Accuracies,
    /// Accuracy drop at task switch
    AccuracyDrops,
}

impl AnalysisField {
    /// All fields in storage order.
    pub const ALL: [Self; 4] = [
        Self::Examples,
        Self::LogExamples,
        Self::Accuracies,
        Self::AccuracyDrops,
    ];

    /// Display name of the result set.
    #[must_use]
    pub const fn name(self) -> &'static str {
        RESULT_SET_NAMES[self as usize]
    }
}

/// Running per-task-identity sums of examples to criterion.
#[derive(Debug, Clone)]
pub struct TaskIdentityAccumulator {
    sum: CriterionMatrix,
    count: CriterionMatrix,
}

impl TaskIdentityAccumulator {
    /// Empty accumulator of `identities × num_tasks`.
    #[must_use]
    pub fn new(identities: usize, num_tasks: usize) -> Self {
        Self {
            sum: CriterionMatrix::filled(identities, num_tasks, 0.0),
            count: CriterionMatrix::filled(identities, num_tasks, 0.0),
        }
    }

    /// Fold one run's examples matrix in.
    ///
    /// The task at position `index` of `query_order` is followed along
    /// diagonal `index` of the examples matrix; its `j`-th repetition
    /// lands in column `j`. Unset cells are not counted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a task identity is out of range.
    pub fn add_run(&mut self, examples: &CriterionMatrix, query_order: &[usize]) -> Result<()> {
        for (index, &task) in query_order.iter().enumerate() {
            if task >= self.sum.rows() {
                return Err(Error::InvalidInput(format!(
                    "task identity {task} outside 0..{}",
                    self.sum.rows()
                )));
            }
            for (times, value) in examples.diag(index).into_iter().enumerate() {
                if value.is_nan() || times >= self.sum.cols() {
                    continue;
                }
                self.sum[(task, times)] += value;
                self.count[(task, times)] += 1.0;
            }
        }
        Ok(())
    }

    /// Number of contributions to a cell.
    #[must_use]
    pub fn count(&self, task: usize, times: usize) -> usize {
        self.count.get(task, times).unwrap_or(0.0) as usize
    }

    /// Cell-wise average; cells without contributions are `None`.
    #[must_use]
    pub fn average(&self) -> TaskIdentityAverage {
        let (rows, cols) = self.sum.shape();
        let cells = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| {
                let count = self.count[(r, c)];
                (count > 0.0).then(|| self.sum[(r, c)] / count)
            })
            .collect();
        TaskIdentityAverage { rows, cols, cells }
    }
}

/// Average examples to criterion by `(task identity, times trained - 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskIdentityAverage {
    rows: usize,
    cols: usize,
    cells: Vec<Option<f64>>,
}

impl TaskIdentityAverage {
    /// `(identities, num_tasks)`
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Average for a cell, `None` when no run contributed.
    #[must_use]
    pub fn get(&self, task: usize, times: usize) -> Option<f64> {
        if task >= self.rows || times >= self.cols {
            return None;
        }
        self.cells[task * self.cols + times]
    }

    /// Dense matrix with `fill` in the cells nobody contributed to.
    #[must_use]
    pub fn to_matrix(&self, fill: f64) -> CriterionMatrix {
        let mut matrix = CriterionMatrix::filled(self.rows, self.cols, fill);
        for (i, cell) in self.cells.iter().enumerate() {
            if let Some(value) = cell {
                matrix[(i / self.cols, i % self.cols)] = *value;
            }
        }
        matrix
    }
}

/// Everything computed from one collection of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSet {
    /// Examples to criterion
    pub examples: ResultSet,
    /// Log examples to criterion
    pub log_examples: ResultSet,
    /// Accuracy at task switch
    pub accuracies: ResultSet,
    /// Accuracy drop at task switch
    pub accuracy_drops: ResultSet,
    /// Per-task-identity average examples to criterion
    pub examples_by_task: TaskIdentityAverage,
}

impl AnalysisSet {
    /// Result set for a field.
    #[must_use]
    pub const fn result(&self, field: AnalysisField) -> &ResultSet {
        match field {
            AnalysisField::Examples => &self.examples,
            AnalysisField::LogExamples => &self.log_examples,
            AnalysisField::Accuracies => &self.accuracies,
            AnalysisField::AccuracyDrops => &self.accuracy_drops,
        }
    }
}

/// Parses and aggregates runs.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    parser: RunParser,
    ignore: HashSet<String>,
}

impl Aggregator {
    /// Create an aggregator for the given benchmark shape.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            parser: RunParser::new(config),
            ignore: HashSet::new(),
        }
    }

    /// Skip runs with these names (known-bad runs from a previous pass).
    #[must_use]
    pub fn ignore_runs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }

    /// Whether a run is on the ignore-list.
    #[must_use]
    pub fn is_ignored(&self, run: &RunRecord) -> bool {
        self.ignore.contains(run.name())
    }

    /// Run parser in use.
    #[must_use]
    pub const fn parser(&self) -> &RunParser {
        &self.parser
    }

    /// Aggregate runs fetched from `source`.
    ///
    /// # Errors
    ///
    /// The first failing run aborts the aggregation; add it to the
    /// ignore-list and aggregate again. Returns `InvalidInput` when no
    /// run is left after ignoring.
    pub fn aggregate<S: RunSource>(&self, source: &S, runs: &[RunRecord]) -> Result<AnalysisSet> {
        self.aggregate_with_matrices(source, runs).map(|(analysis, _)| analysis)
    }

    /// Aggregate runs and also return each run's parsed matrices.
    ///
    /// # Errors
    ///
    /// Same as [`Self::aggregate`].
    pub fn aggregate_with_matrices<S: RunSource>(
        &self,
        source: &S,
        runs: &[RunRecord],
    ) -> Result<(AnalysisSet, Vec<RunMatrices>)> {
        let config = self.parser.config();
        let mut parsed = Vec::with_capacity(runs.len());
        let mut by_task =
            TaskIdentityAccumulator::new(config.num_task_identities(), config.num_tasks());

        for run in runs {
            if self.is_ignored(run) {
                debug!(run = run.name(), "ignoring run");
                continue;
            }
            info!(run = run.name(), "processing run");

            let history = source.history(run)?;
            let matrices = self.parser.parse(&history)?;
            by_task.add_run(&matrices.examples, run.query_order())?;
            parsed.push(matrices);
        }

        let analysis = Self::summarise(&parsed, &by_task)?;
        Ok((analysis, parsed))
    }

    /// Build the four result sets from parsed runs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `parsed` is empty.
    pub fn summarise(
        parsed: &[RunMatrices],
        by_task: &TaskIdentityAccumulator,
    ) -> Result<AnalysisSet> {
        if parsed.is_empty() {
            return Err(Error::InvalidInput(
                "no runs left to aggregate".to_string(),
            ));
        }
        let examples: Vec<CriterionMatrix> = parsed.iter().map(|m| m.examples.clone()).collect();
        let log_examples: Vec<CriterionMatrix> = examples.iter().map(CriterionMatrix::ln).collect();
        let accuracies: Vec<CriterionMatrix> = parsed.iter().map(|m| m.accuracy.clone()).collect();
        let drops: Vec<CriterionMatrix> =
            parsed.iter().map(|m| m.accuracy_drop.clone()).collect();

        Ok(AnalysisSet {
            examples: ResultSet::from_stack(AnalysisField::Examples.name(), &examples)?,
            log_examples: ResultSet::from_stack(AnalysisField::LogExamples.name(), &log_examples)?,
            accuracies: ResultSet::from_stack(AnalysisField::Accuracies.name(), &accuracies)?,
            accuracy_drops: ResultSet::from_stack(AnalysisField::AccuracyDrops.name(), &drops)?,
            examples_by_task: by_task.average(),
        })
    }
}

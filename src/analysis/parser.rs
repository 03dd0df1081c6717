//! Run Parser - criterion matrices of a single run
//!
//! A run introduces tasks `1..=N` one at a time. While task `c` is the
//! newest, the window `[start_c, end_c)` of samples trains task `c` at
//! full epoch size and reviews tasks `1..c` with the epoch split evenly
//! between them.
//!
//! Every task trained in window `c` gets one cell:
//!
//! ```text
//! row    = c - t      (times task t has been trained, minus one)
//! column = c - 1      (tasks introduced so far, minus one)
//! ```
//!
//! so the diagonal at offset `t - 1` follows task `t` across its
//! repetitions. A task that never exceeds the criterion within a window
//! is recorded as crossing at the window's first sample.

use tracing::warn;

use crate::config::AnalysisConfig;
use crate::experiment::RunHistory;
use crate::matrix::CriterionMatrix;
use crate::{Error, Result};

/// The three matrices extracted from one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMatrices {
    /// Examples to criterion, `N × N`.
    pub examples: CriterionMatrix,
    /// Accuracy at the end of each window, `(N-1) × (N-1)`.
    pub accuracy: CriterionMatrix,
    /// Accuracy lost at the switch to the next task, `(N-1) × (N-1)`.
    pub accuracy_drop: CriterionMatrix,
}

/// Parses run histories into [`RunMatrices`].
#[derive(Debug, Clone, Default)]
pub struct RunParser {
    config: AnalysisConfig,
}

impl RunParser {
    /// Create a parser for the given benchmark shape.
    #[must_use]
    pub const fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Benchmark configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Extract the examples, accuracy and accuracy-drop matrices.
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` if a task's accuracy column is absent or
    /// never logged, `MissingSample` if a window boundary falls past the
    /// end of the history, and `InvalidInput` if the second task starts
    /// at the very first sample.
    pub fn parse(&self, history: &RunHistory) -> Result<RunMatrices> {
        let n = self.config.num_tasks();
        let threshold = self.config.accuracy_threshold();
        let mut examples = CriterionMatrix::unset(n, n);
        let mut accuracy = CriterionMatrix::unset(n - 1, n - 1);
        let mut accuracy_drop = CriterionMatrix::unset(n - 1, n - 1);

        let first_column = self.config.accuracy_column(1);
        let first_task_finished = self.task_start(history, 2)?.checked_sub(1).ok_or_else(|| {
            Error::InvalidInput(format!(
                "run '{}' introduces task 2 at its first sample",
                history.run()
            ))
        })?;
        examples[(0, 0)] =
            first_task_finished as f64 * self.config.examples_per_epoch(1, 1) as f64;
        accuracy[(0, 0)] = history.value(&first_column, first_task_finished + 1)?;
        accuracy_drop[(0, 0)] =
            history.value(&first_column, first_task_finished)? - accuracy[(0, 0)];

        for current in 2..=n {
            let start = self.task_start(history, current)?;
            let end = if current == n {
                history.len()
            } else {
                self.task_start(history, current + 1)?
            };

            for task in 1..=current {
                let cell = (current - task, current - 1);
                let column = self.config.accuracy_column(task);

                // An uncrossed task counts from the window's first sample.
                let index = history
                    .first_index_above(&column, start..end, threshold)?
                    .unwrap_or_else(|| {
                        warn!(
                            run = history.run(),
                            task,
                            window = current,
                            "task never reached criterion within its window"
                        );
                        start
                    });
                let epochs = (index - start + 1) as f64;
                examples[cell] = epochs * self.config.examples_per_epoch(task, current) as f64;

                if current < n {
                    let before = end.checked_sub(1).ok_or_else(|| Error::MissingSample {
                        run: history.run().to_string(),
                        column: column.clone(),
                        index: 0,
                    })?;
                    accuracy[cell] = history.value(&column, end)?;
                    accuracy_drop[cell] = history.value(&column, before)? - accuracy[cell];
                }
            }
        }

        Ok(RunMatrices {
            examples,
            accuracy,
            accuracy_drop,
        })
    }

    fn task_start(&self, history: &RunHistory, task: usize) -> Result<usize> {
        let column = self.config.accuracy_column(task);
        history
            .first_valid_index(&column)?
            .ok_or_else(|| Error::MissingColumn {
                run: history.run().to_string(),
                column,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three tasks, windows of four samples, every task crosses at the
    /// second sample of each window.
    fn three_task_history() -> RunHistory {
        let config = AnalysisConfig::builder().num_tasks(3).build().unwrap();
        let window = |k: usize, crossed: usize| -> Vec<Option<f64>> {
            (0..4).map(|i| Some(if i >= crossed { 0.99 } else { 0.5 + 0.01 * k as f64 })).collect()
        };

        let mut task1 = window(0, 1);
        task1.extend(window(1, 1));
        task1.extend(window(2, 1));
        let mut task2 = vec![None; 4];
        task2.extend(window(0, 1));
        task2.extend(window(1, 1));
        let mut task3 = vec![None; 8];
        task3.extend(window(0, 1));

        RunHistory::from_columns(
            "synthetic",
            vec![
                (config.accuracy_column(1), task1),
                (config.accuracy_column(2), task2),
                (config.accuracy_column(3), task3),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cells_land_on_predicted_diagonals() {
        let config = AnalysisConfig::builder().num_tasks(3).build().unwrap();
        let parser = RunParser::new(config);
        let m = parser.parse(&three_task_history()).unwrap();

        // Task 1 first window: task 2 starts at sample 4
        assert_eq!(m.examples.get(0, 0), Some(3.0 * 22_500.0));
        // Window 2: new task 2 at full epoch, task 1 shares one epoch
        assert_eq!(m.examples.get(0, 1), Some(2.0 * 22_500.0));
        assert_eq!(m.examples.get(1, 1), Some(2.0 * 22_500.0));
        // Window 3: review tasks share the epoch between two tasks
        assert_eq!(m.examples.get(0, 2), Some(2.0 * 22_500.0));
        assert_eq!(m.examples.get(1, 2), Some(2.0 * 11_250.0));
        assert_eq!(m.examples.get(2, 2), Some(2.0 * 11_250.0));
        // Below the band stays unset
        assert!(m.examples.get(1, 0).is_none());
        assert!(m.examples.get(2, 0).is_none());
        assert!(m.examples.get(2, 1).is_none());
        assert_eq!(m.examples.populated().count(), 6);
    }

    #[test]
    fn test_accuracy_and_drop_at_switch() {
        let config = AnalysisConfig::builder().num_tasks(3).build().unwrap();
        let m = RunParser::new(config).parse(&three_task_history()).unwrap();

        // Task 1 at the first sample of window 2 (0.51) after ending at 0.99
        let close = |cell: Option<f64>, expected: f64| (cell.unwrap() - expected).abs() < 1e-12;
        assert!(close(m.accuracy.get(0, 0), 0.51));
        assert!(close(m.accuracy_drop.get(0, 0), 0.48));
        // Window 2 switch: both tasks measured at the start of window 3
        assert!(close(m.accuracy.get(0, 1), 0.51));
        assert!(close(m.accuracy.get(1, 1), 0.52));
        assert_eq!(m.accuracy.shape(), (2, 2));
    }

    #[test]
    fn test_missing_column_propagates() {
        let config = AnalysisConfig::builder().num_tasks(4).build().unwrap();
        let err = RunParser::new(config).parse(&three_task_history()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column.ends_with("#4")));
    }

    #[test]
    fn test_uncrossed_task_counts_one_epoch() {
        let config = AnalysisConfig::builder()
            .num_tasks(3)
            .accuracy_threshold(0.999)
            .build()
            .unwrap();
        let m = RunParser::new(config).parse(&three_task_history()).unwrap();
        assert_eq!(m.examples.get(0, 1), Some(22_500.0));
        assert_eq!(m.examples.get(1, 1), Some(22_500.0));
        assert_eq!(m.examples.get(2, 2), Some(11_250.0));
        // First window does not use the threshold
        assert_eq!(m.examples.get(0, 0), Some(3.0 * 22_500.0));
    }
}

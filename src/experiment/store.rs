//! Experiment Store - in-memory run source
//!
//! Holds projects, runs and logged metric samples. Histories are
//! assembled on request: one row per distinct logged step, one column
//! per metric key, gaps where a key was not logged at that step.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{MetricRecord, ProjectRecord, RunHistory, RunRecord, RunSource};
use crate::Result;

/// In-memory store for experiment tracking data.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    projects: HashMap<String, ProjectRecord>,
    runs: Vec<RunRecord>,
    metrics: Vec<MetricRecord>,
}

impl ExperimentStore {
    /// Create a new empty experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty (no projects, runs, or metrics).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.runs.is_empty() && self.metrics.is_empty()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Get the number of metric samples in the store.
    #[must_use]
    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    /// Add a project to the store.
    pub fn add_project(&mut self, project: ProjectRecord) {
        self.projects.insert(project.path().to_string(), project);
    }

    /// Get a project by path.
    #[must_use]
    pub fn get_project(&self, path: &str) -> Option<&ProjectRecord> {
        self.projects.get(path)
    }

    /// Add a run, replacing any run with the same ID.
    ///
    /// Listing order is insertion order.
    pub fn add_run(&mut self, run: RunRecord) {
        self.runs.retain(|existing| existing.run_id() != run.run_id());
        self.runs.push(run);
    }

    /// Get a run by ID.
    #[must_use]
    pub fn get_run(&self, run_id: &str) -> Option<&RunRecord> {
        self.runs.iter().find(|run| run.run_id() == run_id)
    }

    /// Add a metric sample to the store.
    pub fn add_metric(&mut self, metric: MetricRecord) {
        self.metrics.push(metric);
    }

    /// Log one sample per `(key, value)` pair at `step`.
    pub fn log(&mut self, run_id: &str, step: u64, values: &[(&str, f64)]) {
        for (key, value) in values {
            self.add_metric(MetricRecord::new(run_id, *key, step, *value));
        }
    }
}

impl RunSource for ExperimentStore {
    fn runs(&self, project: &str) -> Result<Vec<RunRecord>> {
        Ok(self
            .runs
            .iter()
            .filter(|run| run.project() == project)
            .cloned()
            .collect())
    }

    fn history(&self, run: &RunRecord) -> Result<RunHistory> {
        let samples: Vec<&MetricRecord> = self
            .metrics
            .iter()
            .filter(|m| m.run_id() == run.run_id())
            .collect();

        let steps: Vec<u64> = samples
            .iter()
            .map(|m| m.step())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let row_of: HashMap<u64, usize> = steps.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        // BTreeMap keeps column order stable across calls
        let mut columns: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
        for metric in samples {
            let column = columns
                .entry(metric.key())
                .or_insert_with(|| vec![None; steps.len()]);
            column[row_of[&metric.step()]] = Some(metric.value());
        }

        RunHistory::from_columns(
            run.name(),
            columns
                .into_iter()
                .map(|(key, values)| (key.to_string(), values))
                .collect(),
        )
    }
}

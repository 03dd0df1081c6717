//! Synthetic sequential-benchmark runs shared by the integration tests

#![allow(dead_code)]

use taskseq_analysis::experiment::{ExperimentStore, RunHistory, RunRecord};

pub const BELOW: f64 = 0.5;
pub const ABOVE: f64 = 0.97;

pub fn column(task: usize) -> String {
    format!("Test Accuracy, Query #{task}")
}

/// Accuracy columns of a run with `windows[c - 1]` samples while task `c`
/// is the newest.
///
/// `crossing(t, c)` is the 1-based sample of window `c` from which task
/// `t` stays above criterion, `None` if it never gets there.
pub fn sequential_columns(
    windows: &[usize],
    crossing: impl Fn(usize, usize) -> Option<usize>,
) -> Vec<(String, Vec<Option<f64>>)> {
    let total: usize = windows.iter().sum();
    let starts: Vec<usize> = windows
        .iter()
        .scan(0, |acc, &w| {
            let start = *acc;
            *acc += w;
            Some(start)
        })
        .collect();

    (1..=windows.len())
        .map(|task| {
            let mut values = vec![None; total];
            for window in task..=windows.len() {
                for k in 0..windows[window - 1] {
                    let above = crossing(task, window).is_some_and(|x| k + 1 >= x);
                    values[starts[window - 1] + k] = Some(if above { ABOVE } else { BELOW });
                }
            }
            (column(task), values)
        })
        .collect()
}

pub fn sequential_history(
    run: &str,
    windows: &[usize],
    crossing: impl Fn(usize, usize) -> Option<usize>,
) -> RunHistory {
    RunHistory::from_columns(run, sequential_columns(windows, crossing)).unwrap()
}

/// Run record in a test project.
pub fn run(run_id: &str, description: &str, query_order: Vec<usize>) -> RunRecord {
    RunRecord::builder(run_id, "lab/sequential-benchmark")
        .description(description)
        .query_order(query_order)
        .build()
}

/// Add `run` to `store` and log its synthetic accuracy samples.
pub fn log_run(
    store: &mut ExperimentStore,
    run: &RunRecord,
    windows: &[usize],
    crossing: impl Fn(usize, usize) -> Option<usize>,
) {
    store.add_run(run.clone());
    for (key, values) in sequential_columns(windows, crossing) {
        for (step, value) in values.into_iter().enumerate() {
            if let Some(value) = value {
                store.log(run.run_id(), step as u64, &[(key.as_str(), value)]);
            }
        }
    }
}

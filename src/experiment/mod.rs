//! Experiment Tracking Boundary
//!
//! Data structures for the runs fetched from the experiment-tracking
//! service, and the [`RunSource`] trait the analysis reads them through.
//!
//! ## Schema Overview
//!
//! ```text
//! ProjectRecord (1) ──< RunRecord (N) ── RunDescriptor (level, run_id)
//!                           │
//!                           └──< MetricRecord (N) ──> RunHistory [Arrow]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use taskseq_analysis::experiment::{ExperimentStore, RunRecord, RunSource};
//!
//! let mut store = ExperimentStore::new();
//! let run = RunRecord::builder("run-001", "lab/sequential-benchmark-baseline")
//!     .description("baseline 1001")
//!     .query_order(vec![4, 17, 25])
//!     .build();
//! store.add_run(run.clone());
//! store.log("run-001", 0, &[("Test Accuracy, Query #1", 0.5)]);
//!
//! let history = store.history(&run).unwrap();
//! assert_eq!(history.len(), 1);
//! ```

mod descriptor;
mod experiment_record;
mod history;
mod metric_record;
mod run_record;
mod source;
mod store;

pub use descriptor::{Dimension, RunDescriptor};
pub use experiment_record::{ProjectRecord, BASELINE_PROJECT, MODULATED_PROJECT};
pub use history::RunHistory;
pub use metric_record::MetricRecord;
pub use run_record::{RunRecord, RunRecordBuilder, RunStatus};
pub use source::{DirectoryRunSource, RunSource, MANIFEST_FILE};
pub use store::ExperimentStore;

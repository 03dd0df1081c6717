//! # taskseq-analysis: Sequential Task Learning Analysis
//!
//! **Version**: 0.1.0
//!
//! Turns the per-epoch accuracy histories of sequential meta-learning
//! benchmark runs into examples-to-criterion matrices, aggregates them
//! across runs and condition buckets, caches the results and renders
//! the summary figures.
//!
//! ## Pipeline
//!
//! - **Experiment boundary**: runs and their accuracy histories come from
//!   a [`experiment::RunSource`] (in-memory store or a Parquet directory)
//! - **Parsing**: [`analysis::RunParser`] reads one history into three
//!   upper-triangular matrices
//! - **Aggregation**: [`analysis::Aggregator`] summarises many runs into
//!   mean/std result sets plus a per-task-identity average
//! - **Caching**: [`cache::AnalysisCache`] persists analyses with
//!   timestamped backups
//! - **Figures**: [`figure`] renders SVG panels and LaTeX snippets
//!
//! ## Example Usage
//!
//! ```rust
//! use taskseq_analysis::analysis::Aggregator;
//! use taskseq_analysis::config::AnalysisConfig;
//! use taskseq_analysis::experiment::{ExperimentStore, RunRecord};
//!
//! let config = AnalysisConfig::builder().num_tasks(2).build()?;
//! let mut store = ExperimentStore::new();
//! let run = RunRecord::builder("run-1", "lab/benchmark")
//!     .query_order(vec![4, 7])
//!     .build();
//! store.add_run(run.clone());
//! for (step, (a1, a2)) in [(0.5, f64::NAN), (0.97, f64::NAN), (0.96, 0.4), (0.97, 0.98)]
//!     .into_iter()
//!     .enumerate()
//! {
//!     let mut values = vec![("Test Accuracy, Query #1", a1)];
//!     if !a2.is_nan() {
//!         values.push(("Test Accuracy, Query #2", a2));
//!     }
//!     store.log("run-1", step as u64, &values);
//! }
//!
//! let analysis = Aggregator::new(config).aggregate(&store, &[run])?;
//! assert_eq!(analysis.examples.mean.get(0, 0), Some(22_500.0));
//! println!("{}", analysis.examples.mean);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod experiment;
pub mod figure;
pub mod matrix;
pub mod storage;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use matrix::CriterionMatrix;

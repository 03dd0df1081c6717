//! Run parsing and aggregation
//!
//! ```text
//! RunHistory ──RunParser──> RunMatrices ──Aggregator──> AnalysisSet
//!                                              │
//!                                              └──> TaskIdentityAverage
//! ```

mod aggregate;
mod condition;
mod parser;

pub use aggregate::{
    AnalysisField, AnalysisSet, Aggregator, ResultSet, TaskIdentityAccumulator,
    TaskIdentityAverage, RESULT_SET_NAMES,
};
pub use condition::{
    query_modulated_runs_by_dimension, runs_by_dimension, Condition, ConditionAnalyses,
    LevelAnalyses, REPLICATION_LEVELS,
};
pub use parser::{RunMatrices, RunParser};

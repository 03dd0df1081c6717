//! Error types for taskseq-analysis
//!
//! Clear error messages with actionable guidance: a failing run names
//! itself and the column it was missing, so it can go on the ignore-list.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// taskseq-analysis error types
#[derive(Error, Debug)]
pub enum Error {
    /// Expected accuracy column absent from a run history
    #[error("Missing column '{column}' in run '{run}'\nAdd the run to the ignore-list to skip it")]
    MissingColumn {
        /// Run name
        run: String,
        /// Column that was looked up
        column: String,
    },

    /// Sample index outside the run history
    #[error("Missing sample {index} of column '{column}' in run '{run}'")]
    MissingSample {
        /// Run name
        run: String,
        /// Column that was looked up
        column: String,
        /// Row index that was requested
        index: usize,
    },

    /// Run description does not carry a `[level-]run_id` suffix
    #[error("Invalid run descriptor: {0}")]
    InvalidRunDescriptor(String),

    /// Comparison function without a usable null-line value
    #[error("Invalid comparison: {0}\nProvide an explicit null line value for custom comparisons")]
    InvalidComparison(String),

    /// Invalid input parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Analysis cache could not be read or written
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Storage error (Parquet/Arrow)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Figure rendering failed
    #[error("Plot error: {0}")]
    PlotError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow/Parquet error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

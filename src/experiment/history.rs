//! Run History - Arrow-backed sample table of one run
//!
//! One row per logged sample, one nullable `Float64` column per metric
//! key. Row positions are the sample indices the run parser works with.

use arrow::array::{Array, ArrayRef, Float64Array, RecordBatch};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use std::ops::Range;
use std::sync::Arc;

use crate::{Error, Result};

/// Sample table of a run.
#[derive(Debug, Clone)]
pub struct RunHistory {
    run: String,
    batch: RecordBatch,
}

impl RunHistory {
    /// Wrap a record batch, casting numeric columns to `Float64`.
    ///
    /// Non-numeric columns are kept as they are and cannot be looked up
    /// as metric series.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if a cast or the rebuilt batch is invalid.
    pub fn try_new(run: impl Into<String>, batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut fields = Vec::with_capacity(schema.fields().len());
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());

        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            if field.data_type().is_numeric() && field.data_type() != &DataType::Float64 {
                columns.push(compute::cast(column, &DataType::Float64)?);
                fields.push(Field::new(field.name(), DataType::Float64, true));
            } else {
                columns.push(Arc::clone(column));
                fields.push(field.as_ref().clone());
            }
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Self {
            run: run.into(),
            batch,
        })
    }

    /// Build a history from named columns of equal length.
    ///
    /// `None` entries are gaps (not logged at that sample).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the columns differ in length.
    pub fn from_columns(
        run: impl Into<String>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let len = columns.first().map_or(0, |(_, values)| values.len());
        if let Some((name, values)) = columns.iter().find(|(_, values)| values.len() != len) {
            return Err(Error::InvalidInput(format!(
                "column '{name}' has {} samples, expected {len}",
                values.len()
            )));
        }

        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, _)| Field::new(name, DataType::Float64, true))
            .collect();
        let arrays: Vec<ArrayRef> = columns
            .into_iter()
            .map(|(_, values)| Arc::new(Float64Array::from(values)) as ArrayRef)
            .collect();

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Self {
            run: run.into(),
            batch,
        })
    }

    /// Name of the run this history belongs to.
    #[must_use]
    pub fn run(&self) -> &str {
        &self.run
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the history holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Underlying record batch.
    #[must_use]
    pub const fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Whether a metric column exists.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.batch.column_by_name(column).is_some()
    }

    fn series(&self, column: &str) -> Result<&Float64Array> {
        self.batch
            .column_by_name(column)
            .and_then(|array| array.as_any().downcast_ref::<Float64Array>())
            .ok_or_else(|| Error::MissingColumn {
                run: self.run.clone(),
                column: column.to_string(),
            })
    }

    /// First sample index at which `column` is logged.
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` if the column does not exist.
    pub fn first_valid_index(&self, column: &str) -> Result<Option<usize>> {
        let series = self.series(column)?;
        Ok((0..series.len()).find(|&i| series.is_valid(i)))
    }

    /// Value at a sample index, NaN for a gap.
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` if the column does not exist, and
    /// `MissingSample` if `index` is past the last sample.
    pub fn value(&self, column: &str, index: usize) -> Result<f64> {
        let series = self.series(column)?;
        if index >= series.len() {
            return Err(Error::MissingSample {
                run: self.run.clone(),
                column: column.to_string(),
                index,
            });
        }
        Ok(if series.is_valid(index) {
            series.value(index)
        } else {
            f64::NAN
        })
    }

    /// First index in `window` where `column` strictly exceeds `threshold`.
    ///
    /// Gaps never count as above threshold.
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` if the column does not exist.
    pub fn first_index_above(
        &self,
        column: &str,
        window: Range<usize>,
        threshold: f64,
    ) -> Result<Option<usize>> {
        let series = self.series(column)?;
        let end = window.end.min(series.len());
        Ok((window.start..end).find(|&i| series.is_valid(i) && series.value(i) > threshold))
    }
}

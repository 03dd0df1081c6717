//! Storage backend (Arrow/Parquet)
//!
//! Run histories are exported once from the tracking service and then
//! re-analysed many times, so they live on disk as one Parquet file per
//! run. Loading reads every row group and concatenates them into a
//! single record batch (histories are a few thousand rows at most).

use crate::{Error, Result};
use arrow::compute;
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::path::Path;

/// Load a whole Parquet file into one record batch.
///
/// # Errors
/// Returns error if file cannot be read or parsed
pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;

    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch =
            batch.map_err(|e| Error::StorageError(format!("Failed to read record batch: {e}")))?;
        batches.push(batch);
    }

    Ok(compute::concat_batches(&schema, &batches)?)
}

/// Write a record batch as a single Parquet file.
///
/// # Errors
/// Returns error if the file cannot be created or written
pub fn save_parquet<P: AsRef<Path>>(path: P, batch: &RecordBatch) -> Result<()> {
    use parquet::arrow::ArrowWriter;

    let file = File::create(path.as_ref())?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(batch)
        .map_err(|e| Error::StorageError(format!("Failed to write record batch: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::StorageError(format!("Failed to finish Parquet file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_parquet_round_trip_keeps_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.parquet");

        let schema = Arc::new(Schema::new(vec![Field::new("acc", DataType::Float64, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float64Array::from(vec![None, Some(0.5), Some(0.97)]))],
        )
        .unwrap();

        save_parquet(&path, &batch).unwrap();
        let loaded = load_parquet(&path).unwrap();

        assert_eq!(loaded.num_rows(), 3);
        assert!(loaded.column(0).is_null(0));
    }

    #[test]
    fn test_missing_file_is_storage_error() {
        let err = load_parquet("/nonexistent/history.parquet").unwrap_err();
        assert!(matches!(err, Error::StorageError(_)));
    }
}

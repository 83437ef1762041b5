//! Output writer trait and error types

use crate::record::HarvestedRecord;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur while writing the output sink
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Serializes a batch of harvested records in one output format
pub trait RecordWriter {
    /// Writes all records, in order, to `out`
    ///
    /// # Arguments
    ///
    /// * `records` - Records in batch order
    /// * `out` - Destination stream
    fn write_records(&self, records: &[HarvestedRecord], out: &mut dyn Write) -> OutputResult<()>;
}

//! Output module for the harvested records and run reports
//!
//! This module handles:
//! - Writing the final record list as JSON or CSV
//! - Summarizing a batch run
//! - Reporting cache statistics

mod csv_output;
mod json_output;
pub mod stats;
mod traits;

pub use csv_output::CsvWriter;
pub use json_output::JsonWriter;
pub use stats::{
    load_cache_statistics, print_cache_statistics, print_run_summary, CacheStatistics, RunSummary,
};
pub use traits::{OutputError, OutputResult, RecordWriter};

use crate::config::OutputFormat;
use crate::record::HarvestedRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the harvested records to the output sink
///
/// # Arguments
///
/// * `records` - Records in batch order
/// * `path` - Destination file, replaced if it exists
/// * `format` - Serialization format
///
/// # Returns
///
/// * `Ok(())` - All records written
/// * `Err(OutputError)` - The file could not be created or written
pub fn write_records(
    records: &[HarvestedRecord],
    path: &Path,
    format: OutputFormat,
) -> OutputResult<()> {
    let writer: &dyn RecordWriter = match format {
        OutputFormat::Json => &JsonWriter,
        OutputFormat::Csv => &CsvWriter,
    };

    let mut file = BufWriter::new(File::create(path)?);
    writer.write_records(records, &mut file)?;
    file.flush()?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

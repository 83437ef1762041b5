//! Identifier sources
//!
//! Identifiers come either from a CSV column or from a plain text file with
//! one identifier per line. Blank lines and `#` comments are skipped in text
//! files; empty cells are skipped in CSV files. Deduplication keeps the first
//! occurrence so the batch order is preserved.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading identifiers
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },
}

/// Loads identifiers from a file
///
/// # Arguments
///
/// * `path` - Input file
/// * `column` - CSV column to read; `None` reads one identifier per line
/// * `dedup` - Drop repeated identifiers, keeping the first occurrence
pub fn load_identifiers(
    path: &Path,
    column: Option<&str>,
    dedup: bool,
) -> Result<Vec<String>, InputError> {
    let identifiers = match column {
        Some(column) => read_csv_column(path, column)?,
        None => read_lines(path)?,
    };

    let identifiers = if dedup {
        dedup_preserving_order(identifiers)
    } else {
        identifiers
    };

    tracing::info!("Loaded {} identifiers from {}", identifiers.len(), path.display());
    Ok(identifiers)
}

fn read_lines(path: &Path) -> Result<Vec<String>, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn read_csv_column(path: &Path, column: &str) -> Result<Vec<String>, InputError> {
    let csv_error = |source: csv::Error| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let index = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| InputError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;

    let mut identifiers = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        if let Some(value) = row.get(index).map(str::trim).filter(|v| !v.is_empty()) {
            identifiers.push(value.to_string());
        }
    }
    Ok(identifiers)
}

/// Removes repeats, keeping each identifier at its first position
pub fn dedup_preserving_order(identifiers: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

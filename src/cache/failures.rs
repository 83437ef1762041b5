//! Ledger of identifiers that could not be harvested
//!
//! Kept apart from the record cache so the cache only ever holds successes.
//! Used when the configuration asks for failures to be remembered.

use crate::cache::json::{load_json_map, write_json_atomic};
use crate::cache::traits::CacheResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Why and when an identifier failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Persistent `identifier -> failure` map, flushed on every record
#[derive(Debug)]
pub struct FailureLedger {
    path: PathBuf,
    entries: BTreeMap<String, FailureEntry>,
}

impl FailureLedger {
    /// Opens a ledger file, starting empty when it does not exist
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = load_json_map(&path)?;
        Ok(Self { path, entries })
    }

    pub fn get(&self, identifier: &str) -> Option<&FailureEntry> {
        self.entries.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Records a failure, overwriting an earlier one for the same identifier
    pub fn record(&mut self, identifier: &str, reason: impl Into<String>) -> CacheResult<()> {
        let mut updated = self.entries.clone();
        updated.insert(
            identifier.to_string(),
            FailureEntry {
                reason: reason.into(),
                recorded_at: Utc::now(),
            },
        );
        write_json_atomic(&self.path, &updated)?;
        self.entries = updated;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

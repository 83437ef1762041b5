//! Cache store trait and error types

use crate::record::CompanyRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or persisting a cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Identifier-keyed store of successfully extracted records
///
/// Only successes are ever stored. Entries never expire; a stored record is
/// returned unchanged for the lifetime of the backing store.
pub trait CacheStore {
    /// Gets the record stored for an identifier
    fn get(&self, identifier: &str) -> Option<&CompanyRecord>;

    /// Stores a record, replacing any previous one
    ///
    /// Persistent implementations flush before returning, so a record that
    /// was `put` survives a crash right after the call.
    fn put(&mut self, identifier: &str, record: CompanyRecord) -> CacheResult<()>;

    fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    /// Number of stored records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored identifiers, sorted
    fn identifiers(&self) -> Vec<String>;
}

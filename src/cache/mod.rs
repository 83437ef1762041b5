//! Cache module for persisting harvested records
//!
//! This module handles:
//! - The identifier-keyed record cache consulted before any network activity
//! - A JSON file backend with write-through persistence
//! - An in-memory backend
//! - The optional failure ledger

mod failures;
mod json;
mod memory;
mod traits;

pub use failures::{FailureEntry, FailureLedger};
pub use json::JsonFileCache;
pub use memory::MemoryCache;
pub use traits::{CacheError, CacheResult, CacheStore};

use std::path::Path;

/// Opens the record cache at `path`
///
/// # Arguments
///
/// * `path` - Path to the JSON cache file
///
/// # Returns
///
/// * `Ok(JsonFileCache)` - Cache loaded, empty if the file did not exist
/// * `Err(CacheError)` - The file could not be read or is corrupt
pub fn open_cache(path: &Path) -> CacheResult<JsonFileCache> {
    JsonFileCache::open(path)
}

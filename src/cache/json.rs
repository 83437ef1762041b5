//! JSON file cache
//!
//! The whole cache is one JSON object mapping identifier to record. It is read
//! once at open and rewritten in full on every `put`. Writes go to a sibling
//! temp file which is then renamed over the cache, so an interrupted write
//! leaves the previous version in place.

use crate::cache::traits::{CacheError, CacheResult, CacheStore};
use crate::record::CompanyRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Write-through cache persisted as a single JSON file
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    records: BTreeMap<String, CompanyRecord>,
}

impl JsonFileCache {
    /// Opens a cache file, starting empty when it does not exist
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the cache file
    ///
    /// # Returns
    ///
    /// * `Ok(JsonFileCache)` - Cache loaded (possibly empty)
    /// * `Err(CacheError::Corrupt)` - The file exists but is not a valid cache
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref().to_path_buf();
        let records = load_json_map(&path)?;
        tracing::info!("Loaded {} cached records from {}", records.len(), path.display());
        Ok(Self { path, records })
    }

}

impl CacheStore for JsonFileCache {
    fn get(&self, identifier: &str) -> Option<&CompanyRecord> {
        self.records.get(identifier)
    }

    /// Persists the updated map first; memory only changes once the file has
    fn put(&mut self, identifier: &str, record: CompanyRecord) -> CacheResult<()> {
        let mut updated = self.records.clone();
        updated.insert(identifier.to_string(), record);
        write_json_atomic(&self.path, &updated)?;
        self.records = updated;
        tracing::debug!("Cached record for {} ({} total)", identifier, self.records.len());
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn identifiers(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }
}

/// Reads a JSON object file into a map, empty if the file does not exist
pub(crate) fn load_json_map<T: DeserializeOwned>(path: &Path) -> CacheResult<BTreeMap<String, T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|source| CacheError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-prints a value to `path` through a temp file and rename
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> CacheResult<()> {
    let json = serde_json::to_string_pretty(value)?;

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, json)?;
    fs::rename(&temp, path)?;
    Ok(())
}

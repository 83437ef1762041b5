//! In-process cache, mostly for tests

use crate::cache::traits::{CacheResult, CacheStore};
use crate::record::CompanyRecord;
use std::collections::BTreeMap;

/// Cache that lives only as long as the process
#[derive(Debug, Default, Clone)]
pub struct MemoryCache {
    records: BTreeMap<String, CompanyRecord>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, identifier: &str) -> Option<&CompanyRecord> {
        self.records.get(identifier)
    }

    fn put(&mut self, identifier: &str, record: CompanyRecord) -> CacheResult<()> {
        self.records.insert(identifier.to_string(), record);
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn identifiers(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }
}

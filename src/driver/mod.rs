//! Batch driver module
//!
//! This module ties the harvester together:
//! - Opening the record cache (and failure ledger) before any network activity
//! - Running the sequential per-identifier loop
//! - Writing the output sink once the loop ends
//! - Planning a batch offline for dry runs

mod batch;

pub use batch::{BatchDriver, BatchOutcome};

use crate::cache::{CacheStore, FailureLedger, JsonFileCache};
use crate::config::{Config, FailedPolicy};
use crate::output::write_records;
use crate::HarvestError;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Runs a full batch: cache, harvest loop, output
///
/// A corrupt cache file aborts the run before any request is made. The
/// output is written even when the run was cancelled, holding whatever was
/// emitted up to that point.
///
/// # Arguments
///
/// * `config` - Harvester configuration
/// * `identifiers` - Identifiers in the order records should be emitted
/// * `cancel` - Token checked between identifiers
///
/// # Example
///
/// ```no_run
/// use registry_harvest::config::load_config;
/// use registry_harvest::run_batch;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let ids = vec!["7707083893".to_string()];
/// let outcome = run_batch(&config, &ids, &CancellationToken::new()).await?;
/// println!("{} records", outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_batch(
    config: &Config,
    identifiers: &[String],
    cancel: &CancellationToken,
) -> Result<BatchOutcome, HarvestError> {
    let cache = JsonFileCache::open(&config.cache.path)?;
    let mut driver = BatchDriver::new(config.clone(), cache)?;

    let outcome = driver.run(identifiers, cancel).await?;

    write_records(
        &outcome.records,
        Path::new(&config.output.path),
        config.output.resolved_format(),
    )?;

    Ok(outcome)
}

/// How a batch would be served, computed without network access
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub cached: Vec<String>,
    pub known_failures: Vec<String>,
    pub to_fetch: Vec<String>,
}

/// Splits identifiers into cached, remembered-failed and to-be-fetched
pub fn plan_batch(
    cache: &dyn CacheStore,
    ledger: Option<&FailureLedger>,
    identifiers: &[String],
) -> BatchPlan {
    let mut plan = BatchPlan::default();
    for identifier in identifiers {
        if cache.contains(identifier) {
            plan.cached.push(identifier.clone());
        } else if ledger.is_some_and(|l| l.contains(identifier)) {
            plan.known_failures.push(identifier.clone());
        } else {
            plan.to_fetch.push(identifier.clone());
        }
    }
    plan
}

/// Opens the failure ledger if the configuration enables it
pub fn open_ledger(config: &Config) -> Result<Option<FailureLedger>, HarvestError> {
    match (config.cache.failed_policy, &config.cache.failed_path) {
        (FailedPolicy::Remember, Some(path)) => Ok(Some(FailureLedger::open(path)?)),
        _ => Ok(None),
    }
}

//! Batch driver - the per-identifier harvest loop
//!
//! For each identifier, in input order:
//! - A cache hit is emitted without any network activity
//! - An identifier that already failed earlier in this run is skipped
//! - A remembered failure is skipped (when the failure ledger is enabled)
//! - Otherwise the identifier is resolved, its profile fetched and extracted,
//!   and the record cached before it is emitted
//!
//! The session is rebuilt after every `rotate-every` network-processed
//! identifiers. Cancellation is only observed between identifiers, so a cache
//! write is never interrupted.

use crate::cache::{CacheStore, FailureLedger};
use crate::config::Config;
use crate::driver::open_ledger;
use crate::extract::extract;
use crate::fetch::{fetch, FetchFailure, FetchRequest, RetryPolicy};
use crate::output::RunSummary;
use crate::record::{CompanyRecord, HarvestedRecord};
use crate::resolver::LinkResolver;
use crate::session::SessionContext;
use crate::HarvestError;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Records emitted by a run, in input order, plus its counters
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub records: Vec<HarvestedRecord>,
    pub summary: RunSummary,
}

/// What happened to one identifier
#[derive(Debug)]
enum Outcome {
    Cached(CompanyRecord),
    Fetched(CompanyRecord),
    FailedThisRun,
    KnownFailure,
    Unresolved,
    Failed(FetchFailure),
}

/// Sequential harvest loop over a cache backend
pub struct BatchDriver<C: CacheStore> {
    config: Config,
    cache: C,
    ledger: Option<FailureLedger>,
    resolver: LinkResolver,
    policy: RetryPolicy,
    session: SessionContext,
}

impl<C: CacheStore> BatchDriver<C> {
    /// Creates a driver; no network activity happens here
    ///
    /// # Arguments
    ///
    /// * `config` - Harvester configuration
    /// * `cache` - Record cache consulted before any request
    ///
    /// # Returns
    ///
    /// * `Ok(BatchDriver)` - Ready to run
    /// * `Err(HarvestError)` - Bad base URL, unusable session identity, or an
    ///   unreadable failure ledger
    pub fn new(config: Config, cache: C) -> Result<Self, HarvestError> {
        let resolver = LinkResolver::new(&config.site)?;
        let policy = RetryPolicy::from_config(&config.fetch);
        let session = SessionContext::new(&config.session, resolver.base_url(), 1)?;

        let ledger = open_ledger(&config)?;
        if let Some(ledger) = &ledger {
            tracing::info!("Failure ledger lists {} identifiers", ledger.len());
        }

        Ok(Self {
            config,
            cache,
            ledger,
            resolver,
            policy,
            session,
        })
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Runs the harvest loop over `identifiers`
    ///
    /// Unresolved and failed identifiers are logged and left out of the
    /// result. Only cache persistence errors abort the run.
    pub async fn run(
        &mut self,
        identifiers: &[String],
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, HarvestError> {
        let total = identifiers.len();
        let mut summary = RunSummary::start(total);
        summary.sessions = 1;
        let mut records = Vec::new();
        let mut since_rotation: u32 = 0;
        let mut failed_this_run: HashSet<String> = HashSet::new();

        tracing::info!("Starting batch of {} identifiers", total);

        for (index, identifier) in identifiers.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    "Cancelled after {} of {} identifiers",
                    index,
                    total
                );
                summary.cancelled = true;
                break;
            }

            let position = index + 1;
            let outcome = match self.offline_outcome(identifier, &failed_this_run) {
                Some(outcome) => outcome,
                None => {
                    if since_rotation >= self.config.session.rotate_every {
                        self.session
                            .rotate(&self.config.session, self.resolver.base_url())?;
                        summary.sessions += 1;
                        since_rotation = 0;
                    }
                    since_rotation += 1;
                    self.harvest(identifier).await?
                }
            };

            match outcome {
                Outcome::Cached(record) => {
                    tracing::info!("[{}/{}] {}: from cache", position, total, identifier);
                    summary.from_cache += 1;
                    records.push(HarvestedRecord {
                        identifier: identifier.clone(),
                        record,
                    });
                }
                Outcome::Fetched(record) => {
                    tracing::info!(
                        "[{}/{}] {}: harvested {}",
                        position,
                        total,
                        identifier,
                        record.short_name.as_deref().unwrap_or("(unnamed)")
                    );
                    summary.fetched += 1;
                    records.push(HarvestedRecord {
                        identifier: identifier.clone(),
                        record,
                    });
                }
                Outcome::FailedThisRun => {
                    tracing::info!(
                        "[{}/{}] {}: skipped, already failed in this run",
                        position,
                        total,
                        identifier
                    );
                    summary.skipped_repeats += 1;
                }
                Outcome::KnownFailure => {
                    tracing::info!(
                        "[{}/{}] {}: skipped, failed on an earlier run",
                        position,
                        total,
                        identifier
                    );
                    summary.skipped_known_failures += 1;
                }
                Outcome::Unresolved => {
                    tracing::warn!("[{}/{}] {}: no profile found", position, total, identifier);
                    summary.unresolved += 1;
                    failed_this_run.insert(identifier.clone());
                    self.remember_failure(identifier, "no profile link in lookup response")?;
                }
                Outcome::Failed(failure) => {
                    tracing::warn!("[{}/{}] {}: {}", position, total, identifier, failure);
                    summary.failed += 1;
                    failed_this_run.insert(identifier.clone());
                    self.remember_failure(identifier, &failure.to_string())?;
                }
            }
        }

        summary.finish();
        tracing::info!(
            "Batch finished: {} records ({} cached, {} fetched), {} unresolved, {} failed",
            summary.emitted(),
            summary.from_cache,
            summary.fetched,
            summary.unresolved,
            summary.failed
        );

        Ok(BatchOutcome { records, summary })
    }

    /// Outcome decided without touching the network, if any
    fn offline_outcome(
        &self,
        identifier: &str,
        failed_this_run: &HashSet<String>,
    ) -> Option<Outcome> {
        if let Some(record) = self.cache.get(identifier) {
            tracing::debug!("Cache hit for {}", identifier);
            return Some(Outcome::Cached(record.clone()));
        }
        if failed_this_run.contains(identifier) {
            return Some(Outcome::FailedThisRun);
        }
        match &self.ledger {
            Some(ledger) if ledger.contains(identifier) => Some(Outcome::KnownFailure),
            _ => None,
        }
    }

    /// Resolves, fetches, extracts and caches one identifier
    async fn harvest(&mut self, identifier: &str) -> Result<Outcome, HarvestError> {
        let profile_url = match self
            .resolver
            .resolve(&self.session, &self.policy, identifier)
            .await
        {
            Ok(Some(url)) => url,
            Ok(None) => return Ok(Outcome::Unresolved),
            Err(failure) => return Ok(Outcome::Failed(failure)),
        };
        tracing::debug!("Resolved {} to {}", identifier, profile_url);

        let request = FetchRequest::get(profile_url, self.policy.timeout);
        let page = match fetch(&self.session, &self.policy, &request).await {
            Ok(page) => page,
            Err(failure) => return Ok(Outcome::Failed(failure)),
        };
        if page.attempts > 1 {
            tracing::debug!(
                "Profile for {} took {} attempts ({:?} backoff)",
                identifier,
                page.attempts,
                page.backoff
            );
        }

        let record = extract(&page.body);
        self.cache.put(identifier, record.clone())?;
        Ok(Outcome::Fetched(record))
    }

    fn remember_failure(&mut self, identifier: &str, reason: &str) -> Result<(), HarvestError> {
        if let Some(ledger) = self.ledger.as_mut() {
            ledger.record(identifier, reason)?;
        }
        Ok(())
    }
}

//! Run summaries and cache statistics
//!
//! This module provides the per-run counters reported at the end of a batch
//! and the cache overview printed by `--stats`.

use crate::cache::CacheStore;
use crate::record::{CompanyRecord, Founders, Leadership, Procurement, StatusClass};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Counters for one batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Identifiers in the batch
    pub total: usize,

    /// Records served from the cache
    pub from_cache: usize,

    /// Records fetched and extracted during this run
    pub fetched: usize,

    /// Identifiers the lookup endpoint returned no profile for
    pub unresolved: usize,

    /// Identifiers whose lookup or profile fetch gave up
    pub failed: usize,

    /// Identifiers skipped because the failure ledger already lists them
    pub skipped_known_failures: usize,

    /// Repeated identifiers skipped because they already failed in this run
    pub skipped_repeats: usize,

    /// Sessions used, the first one included
    pub sessions: u32,

    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
}

impl RunSummary {
    pub fn start(total: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total,
            from_cache: 0,
            fetched: 0,
            unresolved: 0,
            failed: 0,
            skipped_known_failures: 0,
            skipped_repeats: 0,
            sessions: 0,
            cancelled: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Records emitted to the output
    pub fn emitted(&self) -> usize {
        self.from_cache + self.fetched
    }

    /// Identifiers not reached because of cancellation
    pub fn not_reached(&self) -> usize {
        self.total.saturating_sub(
            self.emitted()
                + self.unresolved
                + self.failed
                + self.skipped_known_failures
                + self.skipped_repeats,
        )
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints a run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");
    println!("  Started:  {}", summary.started_at.to_rfc3339());
    if let Some(finished) = summary.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    println!("  Identifiers:        {}", summary.total);
    println!("  Emitted records:    {}", summary.emitted());
    println!("    from cache:       {}", summary.from_cache);
    println!("    fetched:          {}", summary.fetched);
    println!("  Unresolved:         {}", summary.unresolved);
    println!("  Failed:             {}", summary.failed);
    if summary.skipped_known_failures > 0 {
        println!("  Known failures:     {}", summary.skipped_known_failures);
    }
    if summary.skipped_repeats > 0 {
        println!("  Repeats skipped:    {}", summary.skipped_repeats);
    }
    println!("  Sessions used:      {}", summary.sessions);

    if summary.cancelled {
        println!(
            "\nRun was cancelled; {} identifiers were not processed",
            summary.not_reached()
        );
    }
}

/// Overview of the record cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub total_records: usize,

    /// Records per status classification
    pub by_status: BTreeMap<StatusClass, usize>,

    /// Records in which each section produced a value
    pub section_coverage: Vec<(&'static str, usize)>,
}

const COVERAGE_SECTIONS: [(&str, fn(&CompanyRecord) -> bool); 8] = [
    ("short_name", |r| r.short_name.is_some()),
    ("status", |r| r.status.is_some()),
    ("financials", |r| r.financials.is_some()),
    ("leadership", |r| r.leadership != Leadership::Absent),
    ("founders", |r| r.founders != Founders::ExtractionFailed),
    ("contacts", |r| {
        !(r.contacts.phones.is_empty()
            && r.contacts.emails.is_empty()
            && r.contacts.websites.is_empty())
    }),
    ("activities", |r| !r.activities.is_empty()),
    ("procurement", |r| r.procurement != Procurement::Unavailable),
];

/// Computes statistics over every record in a cache
pub fn load_cache_statistics(cache: &dyn CacheStore) -> CacheStatistics {
    let mut stats = CacheStatistics {
        section_coverage: COVERAGE_SECTIONS.iter().map(|(name, _)| (*name, 0)).collect(),
        ..Default::default()
    };

    for identifier in cache.identifiers() {
        let Some(record) = cache.get(&identifier) else {
            continue;
        };
        stats.total_records += 1;
        *stats.by_status.entry(record.status_class()).or_insert(0) += 1;

        for (slot, (_, present)) in stats.section_coverage.iter_mut().zip(COVERAGE_SECTIONS) {
            if present(record) {
                slot.1 += 1;
            }
        }
    }

    stats
}

/// Prints cache statistics to stdout in a formatted manner
pub fn print_cache_statistics(stats: &CacheStatistics) {
    println!("=== Cache Statistics ===\n");
    println!("  Cached records: {}", stats.total_records);
    println!();

    println!("Records by Status:");
    let mut status_counts: Vec<_> = stats.by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));
    for (class, count) in status_counts {
        println!("  {}: {} ({:.1}%)", class.as_str(), count, percentage(*count, stats.total_records));
    }
    println!();

    println!("Section Coverage:");
    for (section, count) in &stats.section_coverage {
        println!(
            "  {}: {} ({:.1}%)",
            section,
            count,
            percentage(*count, stats.total_records)
        );
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

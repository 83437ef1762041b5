//! Registry-Harvest main entry point
//!
//! This is the command-line interface for the company profile harvester.

use anyhow::{bail, Context};
use clap::Parser;
use registry_harvest::cache::{open_cache, CacheStore};
use registry_harvest::config::{load_config_with_hash, Config};
use registry_harvest::driver::{open_ledger, plan_batch, run_batch};
use registry_harvest::input::{dedup_preserving_order, load_identifiers};
use registry_harvest::output::{load_cache_statistics, print_cache_statistics, print_run_summary};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Registry-Harvest: a throttling-tolerant company profile harvester
///
/// Resolves tax identifiers to company profiles on a business registry,
/// extracts structured records, and caches every success so that re-running
/// a batch never refetches a known company.
#[derive(Parser, Debug)]
#[command(name = "registry-harvest")]
#[command(version)]
#[command(about = "A throttling-tolerant company profile harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Identifiers to harvest; overrides any input file
    #[arg(value_name = "IDENTIFIER")]
    identifiers: Vec<String>,

    /// Read identifiers from this file instead of the configured input
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// CSV column holding identifiers (plain text files have one per line)
    #[arg(long, value_name = "NAME")]
    column: Option<String>,

    /// Drop repeated identifiers, keeping the first occurrence
    #[arg(long)]
    dedup: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be fetched without any network access
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the record cache and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let identifiers = collect_identifiers(&cli, &config)?;

    if cli.dry_run {
        handle_dry_run(&config, &identifiers)
    } else {
        handle_harvest(&config, &identifiers).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("registry_harvest=info,warn"),
            1 => EnvFilter::new("registry_harvest=debug,info"),
            2 => EnvFilter::new("registry_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Picks the identifier source: positional arguments, `--input`, then `[input]`
fn collect_identifiers(cli: &Cli, config: &Config) -> anyhow::Result<Vec<String>> {
    if !cli.identifiers.is_empty() {
        let ids = cli.identifiers.clone();
        return Ok(if cli.dedup {
            dedup_preserving_order(ids)
        } else {
            ids
        });
    }

    if let Some(path) = &cli.input {
        return load_identifiers(path, cli.column.as_deref(), cli.dedup)
            .with_context(|| format!("Failed to read identifiers from {}", path.display()));
    }

    if let Some(input) = &config.input {
        let column = cli.column.as_deref().or(input.column.as_deref());
        let path = Path::new(&input.path);
        return load_identifiers(path, column, cli.dedup || input.dedup)
            .with_context(|| format!("Failed to read identifiers from {}", input.path));
    }

    bail!("No identifiers given: pass them as arguments, use --input, or configure [input]")
}

/// Handles the --dry-run mode: shows what would be served from cache and fetched
fn handle_dry_run(config: &Config, identifiers: &[String]) -> anyhow::Result<()> {
    let cache = open_cache(Path::new(&config.cache.path))
        .with_context(|| format!("Failed to open cache {}", config.cache.path))?;
    let ledger = open_ledger(config)?;
    let plan = plan_batch(&cache, ledger.as_ref(), identifiers);

    println!("=== Registry-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Lookup: {}?{}=<id>", config.site.search_path, config.site.query_param);

    println!("\nFetch Policy:");
    println!(
        "  Courtesy delay: {}-{}ms",
        config.fetch.delay_min_ms, config.fetch.delay_max_ms
    );
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Timeout: {}ms", config.fetch.timeout_ms);
    println!("  Rate limit wait: {}ms x attempt", config.fetch.rate_limit_wait_ms);
    println!("  Transport error wait: {}ms", config.fetch.transport_error_wait_ms);
    println!("  Session rotation: every {} identifiers", config.session.rotate_every);

    println!("\nCache: {} ({} records)", config.cache.path, cache.len());
    println!(
        "Output: {} ({:?})",
        config.output.path,
        config.output.resolved_format()
    );

    println!("\nIdentifiers ({}):", identifiers.len());
    println!("  From cache: {}", plan.cached.len());
    if !plan.known_failures.is_empty() {
        println!("  Known failures, skipped: {}", plan.known_failures.len());
    }
    println!("  To fetch: {}", plan.to_fetch.len());
    for identifier in &plan.to_fetch {
        println!("    * {}", identifier);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows statistics of the record cache
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Cache: {}\n", config.cache.path);

    let cache = open_cache(Path::new(&config.cache.path))
        .with_context(|| format!("Failed to open cache {}", config.cache.path))?;
    let stats = load_cache_statistics(&cache);
    print_cache_statistics(&stats);

    if let Some(ledger) = open_ledger(config)? {
        println!("\nKnown failures: {}", ledger.len());
    }

    Ok(())
}

/// What a Ctrl-C should do
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Finish the current identifier, then stop
    Stop,
    /// Already stopping; leave now
    Exit,
}

fn on_interrupt(cancel: &CancellationToken) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::Exit
    } else {
        cancel.cancel();
        Interrupt::Stop
    }
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config, identifiers: &[String]) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&on_signal) {
                Interrupt::Stop => tracing::warn!(
                    "Interrupt received, stopping after the current identifier \
                     (press Ctrl-C again to exit now)"
                ),
                Interrupt::Exit => {
                    tracing::error!("Second interrupt received, exiting immediately");
                    std::process::exit(130);
                }
            }
        }
    });

    let outcome = run_batch(config, identifiers, &cancel)
        .await
        .context("Harvest failed")?;

    print_run_summary(&outcome.summary);
    println!("\n✓ Output written to: {}", config.output.path);

    Ok(())
}

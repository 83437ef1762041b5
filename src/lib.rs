//! Registry-Harvest: a throttling-tolerant company profile harvester
//!
//! This crate resolves tax identifiers to profile pages on a business registry,
//! fetches them under a courtesy/backoff policy, extracts structured company
//! records, and caches every success so later runs never refetch it.

pub mod cache;
pub mod config;
pub mod driver;
pub mod extract;
pub mod fetch;
pub mod input;
pub mod output;
pub mod record;
pub mod resolver;
pub mod session;

use thiserror::Error;

/// Main error type for Registry-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP session for {base_url}: {source}")]
    Session {
        base_url: String,
        source: reqwest::Error,
    },

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Input error: {0}")]
    Input(#[from] input::InputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid header in config: {0}")]
    InvalidHeader(String),
}

/// Result type alias for Registry-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CacheStore, JsonFileCache, MemoryCache};
pub use config::Config;
pub use driver::{plan_batch, run_batch, BatchDriver, BatchOutcome, BatchPlan};
pub use extract::{extract, extract_with_report};
pub use record::{CompanyRecord, HarvestedRecord, StatusClass};

use serde::Deserialize;
use std::collections::BTreeMap;

/// Main configuration structure for Registry-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub input: Option<InputConfig>,
}

/// Registry endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL that relative profile links are qualified against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the lookup endpoint
    #[serde(rename = "search-path")]
    pub search_path: String,

    /// Query parameter carrying the identifier
    #[serde(rename = "query-param", default = "default_query_param")]
    pub query_param: String,
}

/// Request pacing and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Lower bound of the courtesy delay before each attempt (milliseconds)
    #[serde(rename = "delay-min-ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the courtesy delay before each attempt (milliseconds)
    #[serde(rename = "delay-max-ms")]
    pub delay_max_ms: u64,

    /// Maximum attempts per request, first attempt included
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Base wait after HTTP 429, multiplied by the attempt number (milliseconds)
    #[serde(rename = "rate-limit-wait-ms")]
    pub rate_limit_wait_ms: u64,

    /// Fixed wait after a transport error (milliseconds)
    #[serde(rename = "transport-error-wait-ms")]
    pub transport_error_wait_ms: u64,
}

/// Transport identity shared by every request of one session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Number of network-processed identifiers after which the session is rebuilt
    ///
    /// Only identifiers that go to the network advance the count. Cache hits
    /// and skipped failures do not, so this is not a cadence over batch
    /// positions: a batch of mostly cached identifiers may never rotate.
    #[serde(rename = "rotate-every", default = "default_rotate_every")]
    pub rotate_every: u32,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rotate_every: default_rotate_every(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        }
    }
}

/// What to do with identifiers whose resolution or fetch failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedPolicy {
    /// Never persist failures; the identifier is attempted again next run
    #[default]
    Retry,

    /// Persist failures to a ledger and skip them on later runs
    Remember,
}

/// Cache persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path to the JSON record cache
    pub path: String,

    #[serde(rename = "failed-policy", default)]
    pub failed_policy: FailedPolicy,

    /// Path to the failure ledger, required when `failed-policy = "remember"`
    #[serde(rename = "failed-path", default)]
    pub failed_path: Option<String>,
}

/// Serialization format of the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the final output file
    pub path: String,

    /// Explicit format; inferred from the file extension when absent
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl OutputConfig {
    /// Returns the configured format, falling back to the path extension
    pub fn resolved_format(&self) -> OutputFormat {
        if let Some(format) = self.format {
            return format;
        }
        if self.path.to_ascii_lowercase().ends_with(".csv") {
            OutputFormat::Csv
        } else {
            OutputFormat::Json
        }
    }
}

/// Default identifier source
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub path: String,

    /// CSV column holding identifiers; plain text files have one per line
    #[serde(default)]
    pub column: Option<String>,

    #[serde(default)]
    pub dedup: bool,
}

fn default_query_param() -> String {
    "query".to_string()
}

fn default_rotate_every() -> u32 {
    50
}

//! Session context shared by every request of a batch segment
//!
//! A session owns one HTTP client configured with the registry headers and
//! auth cookies. The batch driver drops and rebuilds it on a fixed cadence so
//! no single cookie session lives long enough to be penalised server-side.

use crate::config::SessionConfig;
use crate::HarvestError;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Transport identity: client, default headers and cookie jar
#[derive(Debug)]
pub struct SessionContext {
    client: Client,
    generation: u32,
    created_at: Instant,
    requests: AtomicU64,
}

impl SessionContext {
    /// Builds a new session
    ///
    /// # Arguments
    ///
    /// * `config` - Headers and cookies to present
    /// * `base_url` - Registry origin the cookies are scoped to
    /// * `generation` - Sequence number of this session within the run, for logs
    pub fn new(
        config: &SessionConfig,
        base_url: &Url,
        generation: u32,
    ) -> Result<Self, HarvestError> {
        let client = build_http_client(config, base_url).map_err(|source| {
            HarvestError::Session {
                base_url: base_url.to_string(),
                source,
            }
        })?;

        tracing::debug!(
            "Session #{} created with {} headers and {} cookies",
            generation,
            config.headers.len(),
            config.cookies.len()
        );

        Ok(Self {
            client,
            generation,
            created_at: Instant::now(),
            requests: AtomicU64::new(0),
        })
    }

    /// Returns the client, counting the request about to be made with it
    pub fn client(&self) -> &Client {
        self.requests.fetch_add(1, Ordering::Relaxed);
        &self.client
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of requests issued through this session
    pub fn requests_made(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Replaces this session with a fresh one carrying the next generation number
    ///
    /// The old client, and with it its cookie jar and pooled connections, is
    /// dropped. On error the current session is left in place.
    pub fn rotate(&mut self, config: &SessionConfig, base_url: &Url) -> Result<(), HarvestError> {
        tracing::info!(
            "Rotating session #{} after {} requests ({:?})",
            self.generation,
            self.requests_made(),
            self.age()
        );
        *self = Self::new(config, base_url, self.generation + 1)?;
        Ok(())
    }
}

/// Builds an HTTP client carrying the configured identity
///
/// Per-request timeouts are set by the retry controller, so the client itself
/// only bounds connection setup.
pub fn build_http_client(config: &SessionConfig, base_url: &Url) -> Result<Client, reqwest::Error> {
    let jar = Arc::new(Jar::default());
    for (name, value) in &config.cookies {
        jar.add_cookie_str(&format!("{}={}", name, value), base_url);
    }

    Client::builder()
        .default_headers(header_map(config))
        .cookie_provider(jar)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Converts configured headers, skipping any that fail to parse
///
/// Configuration validation rejects invalid headers up front, so a skip here
/// only happens for configs built in code.
fn header_map(config: &SessionConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Skipping invalid session header '{}'", name),
        }
    }
    headers
}

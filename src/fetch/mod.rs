//! Retry controller: the resilient GET primitive
//!
//! Every request made by the harvester goes through [`fetch`], which handles:
//! - A randomized courtesy delay before each attempt
//! - Response classification (success, rate limited, transport error, terminal)
//! - Attempt-scaled backoff for HTTP 429 and a fixed wait for transport errors
//!
//! The controller does no caching and no parsing.

mod policy;

pub use policy::RetryPolicy;

use crate::session::SessionContext;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A GET request to issue through the retry controller
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn get(url: Url, timeout: Duration) -> Self {
        Self { url, timeout }
    }
}

/// A 200 response body and how much effort it took
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub body: String,

    /// Attempts used, the successful one included
    pub attempts: u32,

    /// Total backoff slept between attempts, courtesy delays excluded
    pub backoff: Duration,
}

/// Why a single attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("transport error: {0}")]
    Transient(String),
}

/// Why a request was given up on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("gave up on {url} after {attempts} attempts, last error: {last}")]
    ExhaustedRetries {
        url: String,
        attempts: u32,
        last: AttemptError,
    },

    #[error("unexpected HTTP {status} from {url}")]
    TerminalStatus { url: String, status: u16 },
}

/// Classification of one attempt's response
enum Attempt {
    Success(String),
    Retry(AttemptError),
    Terminal(u16),
}

/// Issues a GET under the retry policy
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Success |
/// | HTTP 429 | Wait `rate_limit_wait * attempt`, retry |
/// | Timeout / connection / body read error | Wait `transport_error_wait`, retry |
/// | Any other status | Immediate `TerminalStatus` |
///
/// No backoff is slept after the final attempt.
///
/// # Arguments
///
/// * `session` - The session whose client and identity are used
/// * `policy` - Pacing and retry bounds
/// * `request` - URL and timeout
pub async fn fetch(
    session: &SessionContext,
    policy: &RetryPolicy,
    request: &FetchRequest,
) -> Result<FetchSuccess, FetchFailure> {
    let mut backoff = Duration::ZERO;
    let mut last = AttemptError::Transient("no attempt made".to_string());

    for attempt in 1..=policy.max_attempts {
        let delay = policy.courtesy_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::trace!(
            "GET {} (attempt {}/{}, session #{})",
            request.url,
            attempt,
            policy.max_attempts,
            session.generation()
        );

        let error = match send_once(session, request).await {
            Attempt::Success(body) => {
                return Ok(FetchSuccess {
                    body,
                    attempts: attempt,
                    backoff,
                });
            }
            Attempt::Terminal(status) => {
                tracing::warn!("HTTP {} from {}, not retrying", status, request.url);
                return Err(FetchFailure::TerminalStatus {
                    url: request.url.to_string(),
                    status,
                });
            }
            Attempt::Retry(error) => error,
        };

        let wait = match &error {
            AttemptError::RateLimited => policy.rate_limit_backoff(attempt),
            AttemptError::Transient(_) => policy.transport_error_wait,
        };
        last = error;

        if attempt == policy.max_attempts {
            break;
        }

        tracing::warn!(
            "{} for {} (attempt {}/{}), waiting {:?}",
            last,
            request.url,
            attempt,
            policy.max_attempts,
            wait
        );
        tokio::time::sleep(wait).await;
        backoff += wait;
    }

    Err(FetchFailure::ExhaustedRetries {
        url: request.url.to_string(),
        attempts: policy.max_attempts,
        last,
    })
}

/// Sends one request and classifies the outcome
async fn send_once(session: &SessionContext, request: &FetchRequest) -> Attempt {
    let response = match session
        .client()
        .get(request.url.clone())
        .timeout(request.timeout)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return Attempt::Retry(AttemptError::Transient(describe_transport_error(&e))),
    };

    match response.status() {
        StatusCode::OK => match response.text().await {
            Ok(body) => Attempt::Success(body),
            Err(e) => Attempt::Retry(AttemptError::Transient(describe_transport_error(&e))),
        },
        StatusCode::TOO_MANY_REQUESTS => Attempt::Retry(AttemptError::RateLimited),
        status => Attempt::Terminal(status.as_u16()),
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}

//! Link resolver: identifier to profile URL
//!
//! The registry's lookup endpoint answers with a JSON array of candidate
//! matches, each carrying an HTML fragment. The first candidate's first
//! `href` is the profile link, relative to the site root.

use crate::config::SiteConfig;
use crate::fetch::{fetch, FetchFailure, FetchRequest, RetryPolicy};
use crate::session::SessionContext;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

/// One entry of the lookup response
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: String,
}

/// Resolves identifiers against the lookup endpoint
#[derive(Debug, Clone)]
pub struct LinkResolver {
    base_url: Url,
    search_url: Url,
    query_param: String,
}

impl LinkResolver {
    pub fn new(site: &SiteConfig) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(&site.base_url)?;
        let search_url = base_url.join(&site.search_path)?;
        Ok(Self {
            base_url,
            search_url,
            query_param: site.query_param.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the lookup URL for an identifier
    pub fn lookup_url(&self, identifier: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.query_param, identifier);
        url
    }

    /// Resolves an identifier to its profile URL
    ///
    /// # Returns
    ///
    /// * `Ok(Some(url))` - The first candidate carried a link
    /// * `Ok(None)` - Empty, malformed, or link-less response
    /// * `Err(FetchFailure)` - The lookup request itself failed
    pub async fn resolve(
        &self,
        session: &SessionContext,
        policy: &RetryPolicy,
        identifier: &str,
    ) -> Result<Option<Url>, FetchFailure> {
        let request = FetchRequest::get(self.lookup_url(identifier), policy.timeout);
        let response = fetch(session, policy, &request).await?;
        Ok(self.profile_url_from_body(identifier, &response.body))
    }

    /// Decodes a lookup body and qualifies the first candidate's link
    pub fn profile_url_from_body(&self, identifier: &str, body: &str) -> Option<Url> {
        let candidates: Vec<Candidate> = match serde_json::from_str(body) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Malformed lookup response for {}: {}", identifier, e);
                return None;
            }
        };

        let first = candidates.first()?;
        let href = first_href(&first.content)?;

        match self.base_url.join(&href) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Unusable link '{}' for {}: {}", href, identifier, e);
                None
            }
        }
    }
}

/// Extracts the first `href` attribute from an HTML fragment
pub fn first_href(fragment: &str) -> Option<String> {
    let selector = Selector::parse("[href]").ok()?;
    let document = Html::parse_fragment(fragment);
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

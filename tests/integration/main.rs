//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the registry and exercise the
//! retry controller and the full batch pipeline end-to-end.

mod fetch_tests;
mod pipeline_tests;

use registry_harvest::config::{parse_config, Config};
use std::path::Path;

/// Profile page shared with the extractor unit tests
pub const PROFILE_PAGE: &str = include_str!("../fixtures/company_profile.html");

/// Creates a fast test configuration pointed at a mock server
///
/// Courtesy delays are disabled and backoff waits are kept in the tens of
/// milliseconds. Cache and output files live under `dir`.
pub fn create_test_config(base_url: &str, dir: &Path, extra_cache: &str) -> Config {
    parse_config(&format!(
        r#"
        [site]
        base-url = "{base_url}"
        search-path = "/search/tips"

        [fetch]
        delay-min-ms = 0
        delay-max-ms = 0
        max-attempts = 3
        timeout-ms = 2000
        rate-limit-wait-ms = 20
        transport-error-wait-ms = 10

        [session]
        rotate-every = 50

        [cache]
        path = "{cache}"
        {extra_cache}

        [output]
        path = "{output}"
        "#,
        base_url = base_url,
        cache = dir.join("inn_cache.json").display(),
        output = dir.join("companies.json").display(),
        extra_cache = extra_cache,
    ))
    .expect("test config must be valid")
}

/// Lookup response whose first candidate links to `href`
pub fn lookup_body(href: &str) -> String {
    serde_json::json!([
        { "content": format!("<a href=\"{}\"><b>ООО Пример</b></a>", href) },
        { "content": "<a href=\"/id/0000000000000-other\">Другая компания</a>" }
    ])
    .to_string()
}

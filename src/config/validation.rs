use crate::config::types::{
    CacheConfig, Config, FailedPolicy, FetchConfig, InputConfig, OutputConfig, SessionConfig,
    SiteConfig,
};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_session_config(&config.session)?;
    validate_cache_config(&config.cache)?;
    validate_output_config(&config.output)?;
    if let Some(input) = &config.input {
        validate_input_config(input)?;
    }
    Ok(())
}

/// Validates registry endpoint configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.search_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "search-path must start with '/', got '{}'",
            config.search_path
        )));
    }

    if config.query_param.is_empty() {
        return Err(ConfigError::Validation(
            "query-param cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates pacing and retry configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay-min-ms ({}) must not exceed delay-max-ms ({})",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "timeout-ms must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates session identity configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.rotate_every < 1 {
        return Err(ConfigError::Validation(format!(
            "rotate-every must be >= 1, got {}",
            config.rotate_every
        )));
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(format!("invalid header name '{}'", name)))?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::InvalidHeader(format!("invalid value for header '{}'", name))
        })?;
    }

    for name in config.cookies.keys() {
        if name.is_empty() || name.contains(|c: char| c == '=' || c == ';' || c.is_whitespace()) {
            return Err(ConfigError::Validation(format!(
                "invalid cookie name '{}'",
                name
            )));
        }
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty".to_string(),
        ));
    }

    if config.failed_policy == FailedPolicy::Remember
        && config.failed_path.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::Validation(
            "failed-policy = \"remember\" requires failed-path".to_string(),
        ));
    }

    if config.failed_path.as_deref() == Some(config.path.as_str()) {
        return Err(ConfigError::Validation(
            "failed-path must differ from the cache path".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates identifier source configuration
fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "input path cannot be empty".to_string(),
        ));
    }

    if config.column.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "input column cannot be empty".to_string(),
        ));
    }

    Ok(())
}

//! Configuration validation
//!
//! Rules:
//! - elasticsearch.url is an http(s) URL with a host
//! - timezone is a known IANA zone
//! - encoding is UTF-8
//! - enrich paths have no empty segments
//! - dispatch.concurrency / progress_interval / queue_capacity > 0

use chrono_tz::Tz;
use contracts::{ContractError, FlpConfig};
use reqwest::Url;

/// Validate FlpConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &FlpConfig) -> Result<(), ContractError> {
    validate_url(config)?;
    validate_timezone(config)?;
    validate_encoding(config)?;
    validate_enrich_paths(config)?;
    validate_dispatch(config)?;
    Ok(())
}

fn validate_url(config: &FlpConfig) -> Result<(), ContractError> {
    let raw = config.elasticsearch.url.trim();
    let url = Url::parse(raw).map_err(|e| {
        ContractError::config_validation("elasticsearch.url", format!("'{raw}' is invalid: {e}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ContractError::config_validation(
            "elasticsearch.url",
            format!("'{raw}' must start with http:// or https://"),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ContractError::config_validation(
            "elasticsearch.url",
            format!("'{raw}' has no host"),
        ));
    }
    Ok(())
}

fn validate_timezone(config: &FlpConfig) -> Result<(), ContractError> {
    config.timezone.parse::<Tz>().map_err(|_| {
        ContractError::config_validation(
            "timezone",
            format!("'{}' is not a recognized timezone", config.timezone),
        )
    })?;
    Ok(())
}

fn validate_encoding(config: &FlpConfig) -> Result<(), ContractError> {
    match config.encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" => Ok(()),
        other => Err(ContractError::config_validation(
            "encoding",
            format!("unsupported encoding '{other}', only utf-8 is supported"),
        )),
    }
}

fn validate_enrich_paths(config: &FlpConfig) -> Result<(), ContractError> {
    for path in config.enrich.keys() {
        if path.split('.').any(str::is_empty) {
            return Err(ContractError::config_validation(
                format!("enrich[{path}]"),
                "enrich path must not contain empty segments",
            ));
        }
    }
    Ok(())
}

fn validate_dispatch(config: &FlpConfig) -> Result<(), ContractError> {
    let dispatch = &config.dispatch;
    if dispatch.concurrency == 0 {
        return Err(ContractError::config_validation(
            "dispatch.concurrency",
            "concurrency must be > 0",
        ));
    }
    if dispatch.progress_interval == 0 {
        return Err(ContractError::config_validation(
            "dispatch.progress_interval",
            "progress_interval must be > 0",
        ));
    }
    if dispatch.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "dispatch.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&FlpConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = FlpConfig::default();
        config.elasticsearch.url = "ftp://es:9200".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("elasticsearch.url"));
    }

    #[test]
    fn test_rejects_url_without_host() {
        let mut config = FlpConfig::default();
        config.elasticsearch.url = "https://".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_malformed_urls() {
        for url in ["http://exa mple:9200", "http://host:99999", "http://[::1", "es.local:9200"] {
            let mut config = FlpConfig::default();
            config.elasticsearch.url = url.to_string();
            let err = validate(&config).unwrap_err();
            assert!(err.to_string().contains("elasticsearch.url"), "{url}");
        }
    }

    #[test]
    fn test_accepts_url_with_port_and_path() {
        let mut config = FlpConfig::default();
        config.elasticsearch.url = "https://es.local:9243/cluster".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_unknown_timezone() {
        let mut config = FlpConfig::default();
        config.timezone = "Mars/Olympus".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("timezone"));
    }

    #[test]
    fn test_accepts_named_timezone() {
        let mut config = FlpConfig::default();
        config.timezone = "Europe/Prague".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_other_encoding() {
        let mut config = FlpConfig::default();
        config.encoding = "latin-1".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_enrich_segment() {
        let mut config = FlpConfig::default();
        config
            .enrich
            .insert("observer..site".to_string(), serde_json::json!("dc1"));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("empty segments"));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let mut config = FlpConfig::default();
        config.dispatch.concurrency = 0;
        assert!(validate(&config).is_err());
    }
}

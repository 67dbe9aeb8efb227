//! Configuration parsing
//!
//! Supports TOML (primary) and JSON.

use contracts::{ContractError, FlpConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<FlpConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<FlpConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<FlpConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
timezone = "Europe/Prague"

[elasticsearch]
url = "https://es.internal:9200"
username = "ingest"
password = "secret"
index = "fortigate"
id_key = "msg_id"

[dispatch]
concurrency = 8

[enrich]
"observer.site" = "dc1"
"observer.rack" = 4
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.timezone, "Europe/Prague");
        assert_eq!(config.elasticsearch.url, "https://es.internal:9200");
        assert_eq!(config.elasticsearch.password.as_deref(), Some("secret"));
        assert_eq!(config.elasticsearch.index.as_deref(), Some("fortigate"));
        assert_eq!(config.dispatch.concurrency, 8);
        assert_eq!(config.dispatch.progress_interval, 1000);
        let keys: Vec<_> = config.enrich.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["observer.site", "observer.rack"]);
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let config = parse_toml("").unwrap();
        assert_eq!(config, FlpConfig::default());
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{ "elasticsearch": { "url": "http://localhost:9200" } }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.elasticsearch.username, "elastic");
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("JSON"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}

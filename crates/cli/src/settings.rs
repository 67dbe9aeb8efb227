//! Configuration resolution: file, then CLI / environment overrides.

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::FlpConfig;
use tracing::info;

use crate::cli::{ConnectionArgs, IndexArgs, InputArgs};

/// Load the configuration file, or defaults when there is none
pub fn load_config(explicit: Option<&Path>) -> Result<FlpConfig> {
    ConfigLoader::load_or_default(explicit).context("Failed to load configuration")
}

/// Apply options shared by every command
pub fn apply_input_overrides(config: &mut FlpConfig, args: &InputArgs) {
    if let Some(timezone) = &args.timezone {
        info!(timezone = %timezone, "Overriding timezone from CLI");
        config.timezone = timezone.clone();
    }
    for (path, value) in &args.enrich {
        config
            .enrich
            .insert(path.clone(), serde_json::Value::String(value.clone()));
    }
}

/// Apply `index` command overrides
pub fn apply_index_overrides(config: &mut FlpConfig, args: &IndexArgs) {
    apply_input_overrides(config, &args.input);
    apply_connection_overrides(config, &args.connection);

    let es = &mut config.elasticsearch;
    if let Some(index) = &args.index {
        es.index = Some(index.clone());
    }
    if let Some(pipeline) = &args.pipeline {
        es.pipeline = Some(pipeline.clone());
    }
    if let Some(id_key) = &args.id_key {
        es.id_key = Some(id_key.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config.dispatch.concurrency = concurrency;
    }
}

fn apply_connection_overrides(config: &mut FlpConfig, args: &ConnectionArgs) {
    let es = &mut config.elasticsearch;
    if let Some(url) = &args.url {
        info!(url = %url, "Overriding backend URL from CLI");
        es.url = url.clone();
    }
    if let Some(username) = &args.username {
        es.username = username.clone();
    }
    if let Some(password) = &args.password {
        es.password = Some(password.clone());
    }
    if let Some(ca_cert) = &args.ca_cert {
        es.ca_cert = Some(ca_cert.clone());
    }
    if args.insecure {
        es.verify_certs = false;
    }
}

/// Re-run validation after overrides
pub fn validate(config: &FlpConfig) -> Result<()> {
    ConfigLoader::validate(config).context("Invalid configuration after applying overrides")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn index_args(extra: &[&str]) -> IndexArgs {
        let mut argv = vec!["flp", "index", "-i", "a.log"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Index(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/flp.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("flp.toml");
        std::fs::write(&path, "timezone = \"Europe/Prague\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.timezone, "Europe/Prague");
    }

    #[test]
    fn test_index_overrides() {
        let mut config = FlpConfig::default();
        config.enrich.insert("observer.site".into(), "dc1".into());

        let args = index_args(&[
            "--url",
            "https://es.example:9200",
            "--password",
            "secret",
            "--insecure",
            "--index",
            "fw",
            "--concurrency",
            "5",
            "--timezone",
            "Europe/Prague",
            "--enrich",
            "observer.site=dc2",
        ]);
        apply_index_overrides(&mut config, &args);

        assert_eq!(config.elasticsearch.url, "https://es.example:9200");
        assert_eq!(config.elasticsearch.password.as_deref(), Some("secret"));
        assert!(!config.elasticsearch.verify_certs);
        assert_eq!(config.elasticsearch.index.as_deref(), Some("fw"));
        assert_eq!(config.dispatch.concurrency, 5);
        assert_eq!(config.timezone, "Europe/Prague");
        assert_eq!(config.enrich["observer.site"], serde_json::json!("dc2"));
        validate(&config).unwrap();
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let mut config = FlpConfig::default();
        apply_index_overrides(&mut config, &index_args(&["--timezone", "Mars/Olympus"]));
        assert!(validate(&config).is_err());
    }
}

//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::FlpConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    url: String,
    index: Option<String>,
    pipeline: Option<String>,
    id_key: Option<String>,
    timezone: String,
    auth: bool,
    enrich_keys: Vec<String>,
    concurrency: usize,
}

impl From<&FlpConfig> for ConfigSummary {
    fn from(config: &FlpConfig) -> Self {
        let es = &config.elasticsearch;
        Self {
            url: es.url.clone(),
            index: es.index.clone(),
            pipeline: es.pipeline.clone(),
            id_key: es.id_key.clone(),
            timezone: config.timezone.clone(),
            auth: es.password.is_some(),
            enrich_keys: config.enrich.keys().cloned().collect(),
            concurrency: config.dispatch.concurrency,
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_config(args);
    info!(config = %result.config_path, valid = result.valid, "Validated configuration");

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let path = match ConfigLoader::discover(args.config.as_deref()) {
        Ok(Some(path)) => path,
        Ok(None) => {
            return invalid(
                "<none>".to_string(),
                "No configuration file given and ~/.flpconfig.toml does not exist",
            )
        }
        Err(e) => {
            let shown = args
                .config
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            return invalid(shown, e.to_string());
        }
    };
    let config_path = path.display().to_string();

    match ConfigLoader::load_from_path(&path) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary::from(&config)),
            }
        }
        Err(e) => invalid(config_path, e.to_string()),
    }
}

fn invalid(config_path: String, error: impl Into<String>) -> ValidationResult {
    ValidationResult {
        valid: false,
        config_path,
        error: Some(error.into()),
        warnings: None,
        summary: None,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &FlpConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let es = &config.elasticsearch;

    if es.index.as_deref().is_none_or(str::is_empty) {
        warnings.push("elasticsearch.index is not set - `index` needs --index".to_string());
    }

    if !es.verify_certs {
        warnings.push(
            "elasticsearch.verify_certs is false - certificates are not checked".to_string(),
        );
    }

    if es.password.is_some() && es.url.starts_with("http://") {
        warnings.push("Password configured for a plain http:// URL".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("OK: configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  URL: {}", summary.url);
            println!("  Index: {}", summary.index.as_deref().unwrap_or("-"));
            println!("  Pipeline: {}", summary.pipeline.as_deref().unwrap_or("-"));
            println!("  Id key: {}", summary.id_key.as_deref().unwrap_or("msg_id"));
            println!("  Timezone: {}", summary.timezone);
            println!("  Basic auth: {}", if summary.auth { "yes" } else { "no" });
            println!("  Enrich keys: {}", summary.enrich_keys.join(", "));
            println!("  Concurrency: {}", summary.concurrency);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("INVALID: configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

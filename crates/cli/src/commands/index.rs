//! `index` command implementation.

use anyhow::{Context, Result};
use contracts::{FlpConfig, IndexBackend, IndexTarget};
use dispatcher::{
    CancellationToken, Dispatcher, DispatcherConfig, ElasticsearchBackend, LogBackend,
};
use ingestion::{Enricher, TimestampNormalizer};
use tracing::{info, warn};

use crate::cli::IndexArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::settings;

/// Document id field when neither the CLI nor the config names one
const DEFAULT_ID_KEY: &str = "msg_id";

/// Execute the `index` command
pub async fn run_index(args: &IndexArgs) -> Result<()> {
    let mut config = settings::load_config(args.input.config.as_deref())?;
    settings::apply_index_overrides(&mut config, args);
    settings::validate(&config)?;

    let target = resolve_target(&config)?;
    let pipeline_config = PipelineConfig {
        inputs: args.input.input.clone(),
        compression: args.input.compression,
        head: args.input.head,
        count_lines: !args.no_count,
        id_key: resolve_id_key(&config),
    };

    info!(
        index = %target.index,
        pipeline = ?target.pipeline,
        id_key = ?pipeline_config.id_key,
        files = pipeline_config.inputs.len(),
        "Index run configured"
    );

    if args.dry_run {
        info!("Dry run: documents are logged, not sent");
        run_with_backend(LogBackend::new("dry-run"), target, pipeline_config, &config).await
    } else {
        let backend = ElasticsearchBackend::from_config(&config.elasticsearch)
            .context("Failed to set up the Elasticsearch client")?;
        run_with_backend(backend, target, pipeline_config, &config).await
    }
}

async fn run_with_backend<B: IndexBackend + Sync + 'static>(
    backend: B,
    target: IndexTarget,
    pipeline_config: PipelineConfig,
    config: &FlpConfig,
) -> Result<()> {
    let normalizer = TimestampNormalizer::from_zone_name(&config.timezone)?;
    let enricher = Enricher::new(config.enrich.iter().map(|(k, v)| (k, v.clone())))?;
    let dispatcher = Dispatcher::new(backend, target, DispatcherConfig::from(&config.dispatch));
    let pipeline = Pipeline::new(pipeline_config, dispatcher, normalizer, enricher);

    let cancel = CancellationToken::new();
    let signal_task = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            setup_shutdown_signal().await;
            warn!("Received shutdown signal, stopping pipeline...");
            cancel.cancel();
        }
    });

    let stats = pipeline.run(cancel).await;
    signal_task.abort();

    stats.print_summary();

    if stats.any_failed() {
        return Err(CliError::files_failed(stats.files_failed(), stats.files.len()).into());
    }
    if stats.cancelled {
        return Err(CliError::Interrupted.into());
    }
    info!("Index run finished");
    Ok(())
}

fn resolve_target(config: &FlpConfig) -> Result<IndexTarget, CliError> {
    let es = &config.elasticsearch;
    let index = es
        .index
        .as_deref()
        .filter(|index| !index.is_empty())
        .ok_or(CliError::MissingIndex)?;
    Ok(IndexTarget::new(index).with_pipeline(es.pipeline.clone().filter(|p| !p.is_empty())))
}

/// Configured id key, `msg_id` by default; an empty key disables explicit ids
fn resolve_id_key(config: &FlpConfig) -> Option<String> {
    match config.elasticsearch.id_key.as_deref() {
        Some("") => None,
        Some(key) => Some(key.to_string()),
        None => Some(DEFAULT_ID_KEY.to_string()),
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

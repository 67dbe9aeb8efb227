//! `read` command implementation.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use contracts::FlpConfig;
use ingestion::{Enricher, RecordStream, TimestampNormalizer};
use tracing::{error, info, warn};

use crate::cli::{OutputFormat, ReadArgs};
use crate::error::CliError;
use crate::settings;

/// Execute the `read` command
pub fn run_read(args: &ReadArgs) -> Result<()> {
    let mut config = settings::load_config(args.input.config.as_deref())?;
    settings::apply_input_overrides(&mut config, &args.input);
    settings::validate(&config)?;

    let stages = if args.timestamp {
        Some(Stages::from_config(&config)?)
    } else {
        None
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let total = args.input.input.len();
    let mut failed = 0usize;

    for path in &args.input.input {
        info!(file = %path.display(), "Reading file");
        match read_file(path, args, stages.as_ref(), &mut out) {
            Ok(()) => {}
            Err(e) if is_broken_pipe(&e) => return Ok(()),
            Err(e) => {
                error!(file = %path.display(), error = %format!("{e:#}"), "Failed to read file");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::files_failed(failed, total).into());
    }
    Ok(())
}

/// Normalizer and enricher applied with `--timestamp`
struct Stages {
    normalizer: TimestampNormalizer,
    enricher: Enricher,
}

impl Stages {
    fn from_config(config: &FlpConfig) -> Result<Self> {
        Ok(Self {
            normalizer: TimestampNormalizer::from_zone_name(&config.timezone)?,
            enricher: Enricher::new(config.enrich.iter().map(|(k, v)| (k, v.clone())))?,
        })
    }
}

fn read_file<W: Write>(
    path: &Path,
    args: &ReadArgs,
    stages: Option<&Stages>,
    out: &mut W,
) -> Result<()> {
    let input = &args.input;

    if !args.parse && stages.is_none() {
        let lines = ingestion::decoder::open(path, input.compression)?;
        for line in lines.take(limit(input.head)) {
            writeln!(out, "{}", line?)?;
        }
        return out.flush().map_err(Into::into);
    }

    let mut stream = RecordStream::open(path, input.compression)?.with_head(input.head);
    if let Some(stages) = stages {
        stream = stream
            .with_normalizer(stages.normalizer.clone())
            .with_enricher(stages.enricher.clone());
    }

    for item in stream {
        let record = match item {
            Ok(record) => record,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping malformed record");
                continue;
            }
        };
        match args.format {
            OutputFormat::Json => serde_json::to_writer(&mut *out, &record),
            OutputFormat::JsonPretty => serde_json::to_writer_pretty(&mut *out, &record),
        }
        .context("Failed to write record")?;
        writeln!(out)?;
    }
    out.flush().map_err(Into::into)
}

fn limit(head: Option<u64>) -> usize {
    head.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX))
}

/// Downstream closed stdout (e.g. `flp read ... | head`)
fn is_broken_pipe(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
            || cause
                .downcast_ref::<serde_json::Error>()
                .and_then(|e| e.io_error_kind())
                .is_some_and(|kind| kind == io::ErrorKind::BrokenPipe)
    })
}

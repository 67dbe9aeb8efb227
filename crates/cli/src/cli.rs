//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::CompressionKind;
use std::path::PathBuf;

/// flp - key=value firewall log reader and indexer
#[derive(Parser, Debug)]
#[command(
    name = "flp",
    author,
    version,
    about = "Read key=value firewall logs and ship them to an Elasticsearch index",
    long_about = "Reads plain, gzip or tar-gzip key=value logs, turns every line into a \n\
                  structured record with a canonical timestamp, applies a static \n\
                  enrichment overlay and indexes the records with a bounded worker pool."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FLP_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "FLP_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "FLP_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read log files and print lines or parsed records to stdout
    Read(ReadArgs),

    /// Read log files and index every record
    Index(IndexArgs),

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Options shared by `read` and `index`
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Configuration file (TOML or JSON); defaults to ~/.flpconfig.toml when present
    #[arg(short, long = "config-file", env = "FLP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Input log file (repeatable)
    #[arg(short, long = "input-file", required = true)]
    pub input: Vec<PathBuf>,

    /// Compression of the input files, inferred from the suffix when omitted
    #[arg(long, value_parser = parse_compression)]
    pub compression: Option<CompressionKind>,

    /// Only process the first N lines of each file
    #[arg(long)]
    pub head: Option<u64>,

    /// Default timezone for lines without a `tz` field
    #[arg(long, env = "FLP_TIMEZONE")]
    pub timezone: Option<String>,

    /// Extra enrichment `dotted.path=value` (repeatable, overrides the config file)
    #[arg(long, value_parser = parse_key_value)]
    pub enrich: Vec<(String, String)>,
}

/// Arguments for the `read` command
#[derive(Parser, Debug, Clone)]
pub struct ReadArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Tokenize lines into records instead of printing them raw
    #[arg(long)]
    pub parse: bool,

    /// Output format for parsed records
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Also derive the timestamp and apply enrichment (implies --parse)
    #[arg(long)]
    pub timestamp: bool,
}

/// Arguments for the `index` command
#[derive(Parser, Debug, Clone)]
pub struct IndexArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Target index (overrides elasticsearch.index)
    #[arg(long)]
    pub index: Option<String>,

    /// Ingest pipeline (overrides elasticsearch.pipeline)
    #[arg(long)]
    pub pipeline: Option<String>,

    /// Record field used as document id; empty string disables explicit ids
    #[arg(long)]
    pub id_key: Option<String>,

    /// Number of concurrent index requests
    #[arg(long, env = "FLP_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Skip the line-count pre-pass (no percentage or ETA in progress lines)
    #[arg(long)]
    pub no_count: bool,

    /// Log documents instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

/// Backend connection overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Cluster URL
    #[arg(long, env = "FLP_ES_URL")]
    pub url: Option<String>,

    /// Basic auth user
    #[arg(long, env = "FLP_ES_USERNAME")]
    pub username: Option<String>,

    /// Basic auth password
    #[arg(long, env = "FLP_ES_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// PEM file with an extra trusted CA
    #[arg(long)]
    pub ca_cert: Option<PathBuf>,

    /// Do not verify server certificates
    #[arg(long)]
    pub insecure: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Configuration file to validate; defaults to ~/.flpconfig.toml
    #[arg(short, long = "config-file")]
    pub config: Option<PathBuf>,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Output format of parsed records
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Indented JSON
    JsonPretty,
}

fn parse_compression(value: &str) -> Result<CompressionKind, String> {
    value.parse().map_err(|e: contracts::ContractError| e.to_string())
}

/// Parse `key=value`; the value may itself contain `=`
fn parse_key_value(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.is_empty() => Ok((key.to_string(), val.to_string())),
        _ => Err(format!("expected key=value, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_index_args() {
        let cli = Cli::try_parse_from([
            "flp",
            "index",
            "-i",
            "a.log",
            "-i",
            "b.log.gz",
            "--index",
            "fw",
            "--enrich",
            "observer.name=fw01",
            "--enrich",
            "tags=a=b",
            "--compression",
            "gzip",
            "--id-key",
            "",
        ])
        .unwrap();

        let Commands::Index(args) = cli.command else {
            panic!("expected index command");
        };
        assert_eq!(args.input.input.len(), 2);
        assert_eq!(args.index.as_deref(), Some("fw"));
        assert_eq!(args.input.compression, Some(CompressionKind::Gzip));
        assert_eq!(args.id_key.as_deref(), Some(""));
        assert_eq!(
            args.input.enrich,
            vec![
                ("observer.name".to_string(), "fw01".to_string()),
                ("tags".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["flp", "read"]).is_err());
    }

    #[test]
    fn test_bad_enrich_rejected() {
        assert!(Cli::try_parse_from(["flp", "read", "-i", "a.log", "--enrich", "novalue"]).is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_read_format() {
        let cli = Cli::try_parse_from([
            "flp", "read", "-i", "a.log", "--parse", "--format", "json-pretty",
        ])
        .unwrap();
        let Commands::Read(args) = cli.command else {
            panic!("expected read command");
        };
        assert!(args.parse);
        assert_eq!(args.format, OutputFormat::JsonPretty);
    }
}

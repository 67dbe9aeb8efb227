//! FlpConfig - Config Loader output
//!
//! Describes the complete run configuration: backend endpoint and credentials,
//! decoding and timezone defaults, enrichment overlay and dispatch tuning.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlpConfig {
    /// Indexing backend settings
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Source text encoding
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Default IANA timezone applied to records without a `tz` field
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Static enrichment overlay: dotted path -> literal value
    #[serde(default)]
    pub enrich: IndexMap<String, serde_json::Value>,

    /// Worker pool tuning
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

impl Default for FlpConfig {
    fn default() -> Self {
        Self {
            elasticsearch: ElasticsearchConfig::default(),
            encoding: default_encoding(),
            timezone: default_timezone(),
            enrich: IndexMap::new(),
            dispatch: DispatchSettings::default(),
        }
    }
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Elasticsearch-style endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster
    #[serde(default = "default_url")]
    pub url: String,

    /// Basic auth user
    #[serde(default = "default_username")]
    pub username: String,

    /// Basic auth password (auth is only sent when set)
    #[serde(default)]
    pub password: Option<String>,

    /// PEM file with an additional trusted CA
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    /// Verify server certificates
    #[serde(default = "default_verify_certs")]
    pub verify_certs: bool,

    /// Default target index
    #[serde(default)]
    pub index: Option<String>,

    /// Default ingest pipeline
    #[serde(default)]
    pub pipeline: Option<String>,

    /// Record field used as document id
    #[serde(default)]
    pub id_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: None,
            ca_cert: None,
            verify_certs: default_verify_certs(),
            index: None,
            pipeline: None,
            id_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_url() -> String {
    "http://127.0.0.1:9200".to_string()
}

fn default_username() -> String {
    "elastic".to_string()
}

fn default_verify_certs() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

/// Dispatcher worker pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Emit a progress line every N completed jobs
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    /// Capacity of the job queue between producer and workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            progress_interval: default_progress_interval(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_concurrency() -> usize {
    20
}

fn default_progress_interval() -> u64 {
    1000
}

fn default_queue_capacity() -> usize {
    1024
}

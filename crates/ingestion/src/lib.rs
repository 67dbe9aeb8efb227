//! # Ingestion Pipeline
//!
//! Log file ingestion module.
//!
//! Responsibilities:
//! - Detect compression and decode source files into lines
//! - Tokenize key=value lines into `Record`s
//! - Normalize the canonical timestamp and apply the enrichment overlay
//! - Compose all of the above into a lazy, pull-based `RecordStream`
//!
//! ## Usage Example
//!
//! ```no_run
//! use ingestion::{Enricher, RecordStream, TimestampNormalizer};
//! use std::path::Path;
//!
//! let stream = RecordStream::open(Path::new("fw.log.gz"), None)
//!     .unwrap()
//!     .with_normalizer(TimestampNormalizer::from_zone_name("Europe/Prague").unwrap())
//!     .with_head(Some(10));
//!
//! for item in stream {
//!     match item {
//!         Ok(record) => println!("{}", serde_json::to_string(&record).unwrap()),
//!         Err(e) if e.is_fatal() => break,
//!         Err(e) => eprintln!("skipping: {e}"),
//!     }
//! }
//! ```

pub mod decoder;
mod enricher;
mod error;
mod metrics;
mod stream;
mod timestamp;
mod tokenizer;

// Re-exports
pub use contracts::{CompressionKind, Record};
pub use decoder::{count_lines, count_lines_until, Lines};
pub use enricher::Enricher;
pub use error::{IngestionError, RecordError, Result};
pub use crate::metrics::{IngestionMetrics, MetricsSnapshot};
pub use stream::RecordStream;
pub use timestamp::TimestampNormalizer;
pub use tokenizer::tokenize;

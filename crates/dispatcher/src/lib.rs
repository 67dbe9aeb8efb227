//! # Dispatcher
//!
//! Delivery module.
//!
//! Responsibilities:
//! - Pull `DispatchJob`s from a lazy producer into a bounded queue
//! - Index them through a bounded pool of workers
//! - Count successes and failures without aborting the run
//! - Report progress and ETA, honour cancellation

pub mod backends;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod progress;
mod worker;

pub use backends::{ElasticsearchBackend, LogBackend};
pub use contracts::{DispatchJob, IndexBackend, IndexTarget};
pub use dispatcher::{dispatch_all, DispatchSummary, Dispatcher, DispatcherConfig};
pub use error::DispatcherError;
pub use crate::metrics::{DispatchMetrics, MetricsSnapshot};
pub use progress::{ProgressReport, ProgressTracker};
pub use tokio_util::sync::CancellationToken;
pub use worker::JobOutcome;

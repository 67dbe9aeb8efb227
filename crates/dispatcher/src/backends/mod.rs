//! Index backend implementations

mod elasticsearch;
mod log;

pub use elasticsearch::ElasticsearchBackend;
pub use log::LogBackend;

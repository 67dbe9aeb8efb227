//! # Contracts
//!
//! Interface contracts shared by every stage of the ingestion pipeline.
//! All business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data model
//! - [`Record`]: ordered field map produced by the tokenizer and enriched downstream
//! - [`DispatchJob`]: one record plus its optional document id, consumed once by the dispatcher
//! - [`FlpConfig`]: explicit configuration value passed into each component

mod backend;
mod compression;
mod config;
mod dispatch;
mod error;
mod record;

pub use backend::*;
pub use compression::CompressionKind;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use record::*;

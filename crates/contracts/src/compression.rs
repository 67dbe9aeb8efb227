//! Compression kind of a source log file

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::ContractError;

/// Decoding strategy for a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionKind {
    /// UTF-8 text (`.txt`, `.log`)
    Plain,
    /// Single-member gzip stream (`.gz`)
    Gzip,
    /// gzip-compressed tar archive (`.tgz`)
    TarGzip,
}

impl CompressionKind {
    /// Infer from a file extension (without the leading dot)
    ///
    /// Only the last suffix counts, so `app.tar.gz` is treated as gzip.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "log" => Some(Self::Plain),
            "gz" => Some(Self::Gzip),
            "tgz" => Some(Self::TarGzip),
            _ => None,
        }
    }

    /// Infer from a file path's suffix
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Gzip => "gzip",
            Self::TarGzip => "tgz",
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionKind {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "txt" | "log" => Ok(Self::Plain),
            "gzip" | "gz" => Ok(Self::Gzip),
            "tgz" | "tar-gzip" | "tar.gz" => Ok(Self::TarGzip),
            other => Err(ContractError::config_validation(
                "compression",
                format!("unknown compression kind '{other}', expected plain, gzip or tgz"),
            )),
        }
    }
}

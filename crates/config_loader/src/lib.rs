//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Locate the configuration file (explicit path or `~/.flpconfig.toml`)
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce `FlpConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("flp.toml")).unwrap();
//! println!("Timezone: {}", config.timezone);
//! ```

mod parser;
mod validator;

pub use contracts::FlpConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// File name looked up in the home directory
pub const DEFAULT_CONFIG_FILE: &str = ".flpconfig.toml";

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// `~/.flpconfig.toml`, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE))
    }

    /// Pick the configuration file to load
    ///
    /// An explicit path must exist; the default path is used only when present.
    ///
    /// # Errors
    /// - `ConfigNotFound` for a missing explicit path
    pub fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>, ContractError> {
        Self::discover_with_fallback(explicit, Self::default_path())
    }

    /// Load the discovered configuration file, or defaults when there is none
    ///
    /// # Errors
    /// Any error [`ConfigLoader::discover`] or [`ConfigLoader::load_from_path`] produces.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<FlpConfig, ContractError> {
        match Self::discover(explicit)? {
            Some(path) => {
                info!(config = %path.display(), "Loading configuration");
                Self::load_from_path(&path)
            }
            None => {
                debug!("No configuration file, using defaults");
                Ok(FlpConfig::default())
            }
        }
    }

    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    #[instrument(name = "config_load_from_path", fields(path = %path.display()))]
    pub fn load_from_path(path: &Path) -> Result<FlpConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        debug!(?format, bytes = content.len(), "config file read");
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<FlpConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already built configuration (e.g. after CLI overrides)
    pub fn validate(config: &FlpConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize FlpConfig to TOML string
    pub fn to_toml(config: &FlpConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize FlpConfig to JSON string
    pub fn to_json(config: &FlpConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn discover_with_fallback(
        explicit: Option<&Path>,
        fallback: Option<PathBuf>,
    ) -> Result<Option<PathBuf>, ContractError> {
        match explicit {
            Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
            Some(path) => Err(ContractError::config_not_found(path.display().to_string())),
            None => Ok(fallback.filter(|path| path.exists())),
        }
    }

    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<FlpConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

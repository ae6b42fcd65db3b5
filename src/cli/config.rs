//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/costainka",
//!   "database": "CostaDelInkaDB",
//!   "init_timeout_secs": 30,
//!   "backup_dir": "/var/backups/costainka",
//!   "log_format": "json"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::initializer::InitOptions;
use crate::observability::LogFormat;
use crate::store::check_collection_name;

/// Default database name
pub const DEFAULT_DATABASE: &str = "CostaDelInkaDB";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the directory-backed store (required)
    pub data_dir: PathBuf,

    /// Database name (optional, default "CostaDelInkaDB")
    #[serde(default = "default_database")]
    pub database: String,

    /// Overall initializer deadline in seconds (optional, default 30)
    #[serde(default = "default_init_timeout_secs")]
    pub init_timeout_secs: u64,

    /// Backup destination (optional, default `<data_dir>/backups`)
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    /// Log line format (optional, default "json")
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}
fn default_init_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if check_collection_name(&self.database).is_err() {
            return Err(CliError::config_error(format!(
                "Invalid database name: '{}'",
                self.database
            )));
        }

        if self.init_timeout_secs == 0 {
            return Err(CliError::config_error("init_timeout_secs must be > 0"));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_path(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backups"))
    }

    pub fn init_options(&self) -> InitOptions {
        InitOptions {
            timeout: Duration::from_secs(self.init_timeout_secs),
        }
    }
}

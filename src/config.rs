//! Configuration file support.
//!
//! Every setting has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags override what the file says.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one sub-directory per database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Extension of the table files.
    #[serde(default = "default_table_extension")]
    pub table_extension: String,

    /// Log level used unless RUST_LOG is set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("Databases")
}

fn default_table_extension() -> String {
    "tbl".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            table_extension: default_table_extension(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

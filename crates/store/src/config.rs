//! Store configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Configuration for opening a record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Operator identity recorded as the audit actor
    pub operator: String,
}

impl StoreConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("Cannot read config file: {}", e)))?;
        let config = toml::from_str(&content)
            .map_err(|e| StoreError::Config(format!("Cannot parse config file: {}", e)))?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            db_path: PathBuf::from("terravault.db"),
            operator: "operator-001".to_string(),
        }
    }
}

//! Configuration file handling

use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for trigsync
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database adapter (postgresql, mysql, sqlite)
    #[serde(default)]
    pub adapter: Option<String>,

    /// Tables whose triggers are left out of the dump
    #[serde(default)]
    pub ignore_tables: Vec<String>,

    /// Previous schema file
    #[serde(default)]
    pub previous_schema: Option<String>,

    /// Default snapshot file
    #[serde(default)]
    pub snapshot: Option<String>,

    /// Output format (schema, json)
    #[serde(default)]
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).into_diagnostic()
    }

    /// Try to find and load trigsync.toml in current directory or parent directories
    pub fn find_and_load() -> Result<Option<Self>> {
        let mut current_dir = std::env::current_dir().into_diagnostic()?;

        loop {
            let config_path = current_dir.join("trigsync.toml");
            if config_path.exists() {
                return Ok(Some(Self::from_file(&config_path)?));
            }

            if !current_dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Merge CLI arguments into configuration
    /// CLI arguments take precedence over config file values
    pub fn merge_with_args(
        mut self,
        snapshot: &Option<PathBuf>,
        adapter: &Option<String>,
        ignore_tables: &[String],
        previous_schema: &Option<PathBuf>,
        format: &Option<crate::args::OutputFormat>,
    ) -> Self {
        if let Some(path) = snapshot {
            self.snapshot = Some(path.display().to_string());
        }

        if adapter.is_some() {
            self.adapter = adapter.clone();
        }

        if !ignore_tables.is_empty() {
            self.ignore_tables = ignore_tables.to_vec();
        }

        if let Some(path) = previous_schema {
            self.previous_schema = Some(path.display().to_string());
        }

        if let Some(fmt) = format {
            self.format = Some(format!("{:?}", fmt).to_lowercase());
        }

        self
    }
}

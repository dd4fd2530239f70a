//! Dump configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a trigger dump pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpOptions {
    /// Tables whose triggers are left out of the dump
    pub ignore_tables: Vec<String>,

    /// Schema file written by the previous dump, handed to the migration source
    pub previous_schema: Option<PathBuf>,
}

impl DumpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_table(mut self, table: impl Into<String>) -> Self {
        self.ignore_tables.push(table.into());
        self
    }

    pub fn with_previous_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.previous_schema = Some(path.into());
        self
    }
}

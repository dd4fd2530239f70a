//! Recorded database and migration state for offline replay

use serde::{Deserialize, Serialize};

use crate::connection::{MemoryConnection, TriggerMap};
use crate::dialect::AdapterKind;
use crate::migration::StaticMigration;

/// Introspected triggers plus the declared migrations, captured together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Adapter the triggers were introspected from
    #[serde(default)]
    pub adapter: Option<AdapterKind>,

    /// Trigger name -> source text as the database reported it
    #[serde(default)]
    pub triggers: TriggerMap,

    /// Declared migrations, in the order the migration source yields them
    #[serde(default)]
    pub migrations: Vec<StaticMigration>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// A connection serving this snapshot's triggers.
    ///
    /// `adapter` overrides the recorded adapter when given.
    pub fn connection(&self, adapter: Option<AdapterKind>) -> MemoryConnection {
        let adapter = adapter.or(self.adapter).unwrap_or_default();
        MemoryConnection::new(adapter).with_triggers(self.triggers.clone())
    }
}

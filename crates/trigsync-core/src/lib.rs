//! trigsync-core: trigger reconciliation for schema dumps
//!
//! This library matches the triggers declared by migration builders against
//! the triggers present in a live database, and writes the reconciled set as
//! the triggers section of a schema file.

pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod migration;
pub mod output;
pub mod reconcile;
pub mod schema;
pub mod snapshot;
pub mod trigger;

pub use config::DumpOptions;
pub use connection::{Connection, MemoryConnection, TriggerFilter, TriggerMap};
pub use dialect::AdapterKind;
pub use error::{DumpError, Result};
pub use migration::{
    DeclaredMigration, MigrationOptions, MigrationSource, RenderOptions, StaticBuilder,
    StaticMigration, TriggerBuilder,
};
pub use reconcile::{reconcile, MigrationTriggerSet, Reconciliation, WarningSet};
pub use schema::{dump_schema, SchemaWriter, TriggerDumper};
pub use snapshot::Snapshot;
pub use trigger::{DefinitionKind, TriggerDefinition};

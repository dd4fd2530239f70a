//! Trigger and function definitions

mod extract;
mod filter;
mod normalize;

use serde::{Deserialize, Serialize};

pub use extract::{extract_definition, extract_definitions, split_sql_statements};
pub use filter::{filter_ignored_tables, references_table};
pub use normalize::{probe_name, Normalize, Normalizer, Verbatim, PROBE_PREFIX};

/// What kind of object a `CREATE` statement defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Trigger,
    Function,
}

/// A named object created by one generated statement.
///
/// Names are not unique across a builder's output: a trigger and its backing
/// function are separate definitions of the same builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    /// Object name as written in the statement header (functions keep their `()`)
    pub name: String,
    /// The complete generated statement
    pub statement: String,
    pub kind: DefinitionKind,
}

impl TriggerDefinition {
    pub fn new(name: impl Into<String>, statement: impl Into<String>, kind: DefinitionKind) -> Self {
        Self {
            name: name.into(),
            statement: statement.into(),
            kind,
        }
    }
}

//! In-process connection used for snapshot replay and tests

use tracing::trace;

use super::{Connection, TriggerFilter, TriggerMap};
use crate::dialect::AdapterKind;
use crate::error::{DumpError, Result};
use crate::trigger::extract_definition;

type RewriteFn = Box<dyn Fn(&str) -> String>;

/// A connection over an in-memory trigger catalog.
///
/// Executing a `CREATE ... TRIGGER` or `CREATE FUNCTION` statement registers
/// the object under its header name, optionally passing the text through a
/// rewrite hook the way a database would store it. Transactions snapshot the
/// catalog and rollback restores it.
pub struct MemoryConnection {
    adapter: AdapterKind,
    triggers: TriggerMap,
    savepoints: Vec<TriggerMap>,
    rewrite: Option<RewriteFn>,
    rejected: Vec<String>,
    fail_transactions: bool,
    fail_rollbacks: bool,
    executed: Vec<String>,
    rollbacks: usize,
}

impl MemoryConnection {
    pub fn new(adapter: AdapterKind) -> Self {
        Self {
            adapter,
            triggers: TriggerMap::new(),
            savepoints: Vec::new(),
            rewrite: None,
            rejected: Vec::new(),
            fail_transactions: false,
            fail_rollbacks: false,
            executed: Vec::new(),
            rollbacks: 0,
        }
    }

    /// Seed the catalog with existing triggers
    pub fn with_triggers(mut self, triggers: TriggerMap) -> Self {
        self.triggers = triggers;
        self
    }

    /// Insert a single existing trigger
    pub fn with_trigger(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.triggers.insert(name.into(), source.into());
        self
    }

    /// Store created objects as `rewrite(statement)` instead of verbatim
    pub fn with_rewrite(mut self, rewrite: impl Fn(&str) -> String + 'static) -> Self {
        self.rewrite = Some(Box::new(rewrite));
        self
    }

    /// Fail any statement containing `needle`
    pub fn reject_statements_containing(mut self, needle: impl Into<String>) -> Self {
        self.rejected.push(needle.into());
        self
    }

    /// Fail every attempt to open a transaction
    pub fn fail_transactions(mut self) -> Self {
        self.fail_transactions = true;
        self
    }

    /// Fail every rollback, leaving the transaction's changes in place
    pub fn fail_rollbacks(mut self) -> Self {
        self.fail_rollbacks = true;
        self
    }

    pub fn triggers(&self) -> &TriggerMap {
        &self.triggers
    }

    /// Statements that executed successfully, in order
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }

    pub fn in_transaction(&self) -> bool {
        !self.savepoints.is_empty()
    }
}

impl Connection for MemoryConnection {
    fn adapter(&self) -> AdapterKind {
        self.adapter
    }

    fn list_triggers(&mut self, filter: &TriggerFilter) -> Result<TriggerMap> {
        Ok(self
            .triggers
            .iter()
            .filter(|(name, _)| filter.matches(name))
            .map(|(name, source)| (name.clone(), source.clone()))
            .collect())
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        if let Some(needle) = self.rejected.iter().find(|n| sql.contains(n.as_str())) {
            return Err(DumpError::database(
                "executing statement",
                format!("statement rejected (matched '{}')", needle),
            ));
        }

        if let Some(def) = extract_definition(sql) {
            let stored = match &self.rewrite {
                Some(rewrite) => rewrite(sql),
                None => sql.to_string(),
            };
            trace!(name = %def.name, "registered definition");
            self.triggers.insert(def.name, stored);
        }

        self.executed.push(sql.to_string());
        Ok(())
    }

    fn begin_transaction(&mut self) -> Result<()> {
        if self.fail_transactions {
            return Err(DumpError::database(
                "beginning transaction",
                "transactions are unavailable",
            ));
        }
        self.savepoints.push(self.triggers.clone());
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        if self.fail_rollbacks {
            return Err(DumpError::database("rolling back", "connection reset"));
        }
        let saved = self
            .savepoints
            .pop()
            .ok_or_else(|| DumpError::transaction("rollback without an open transaction"))?;
        self.triggers = saved;
        self.rollbacks += 1;
        Ok(())
    }
}

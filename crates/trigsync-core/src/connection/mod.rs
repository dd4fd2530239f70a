//! Database connection seam and scoped transactions

mod memory;

use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use tracing::warn;

use crate::dialect::AdapterKind;
use crate::error::Result;

pub use memory::MemoryConnection;

/// Trigger name -> source text, in introspection order
pub type TriggerMap = IndexMap<String, String>;

/// Restrictions for `Connection::list_triggers`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerFilter {
    /// Only return triggers/functions with these names
    pub only: Option<Vec<String>>,
    /// Return bare name -> text pairs without extra metadata lookups
    pub simple: bool,
}

impl TriggerFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(names.into_iter().map(Into::into).collect()),
            simple: false,
        }
    }

    pub fn simple(mut self) -> Self {
        self.simple = true;
        self
    }

    /// Check whether a trigger name passes this filter
    pub fn matches(&self, name: &str) -> bool {
        self.only
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == name))
    }
}

/// The database driver as seen by the dump pass.
///
/// A pass assumes exclusive use of its connection.
pub trait Connection {
    /// Which database family is connected
    fn adapter(&self) -> AdapterKind;

    /// Introspect triggers and trigger functions
    fn list_triggers(&mut self, filter: &TriggerFilter) -> Result<TriggerMap>;

    /// Run arbitrary SQL
    fn execute(&mut self, sql: &str) -> Result<()>;

    fn begin_transaction(&mut self) -> Result<()>;

    fn rollback_transaction(&mut self) -> Result<()>;

    /// Driver-specific table name quoting
    fn quote_table_name(&self, name: &str) -> String {
        self.adapter().quote_table_name(name)
    }
}

/// An open transaction that is always rolled back.
///
/// Call [`Transaction::rollback`] to observe rollback failures; a guard that is
/// dropped while still open rolls back and logs any failure.
pub struct Transaction<'c, C: Connection + ?Sized> {
    conn: &'c mut C,
    open: bool,
}

impl<'c, C: Connection + ?Sized> Transaction<'c, C> {
    pub fn begin(conn: &'c mut C) -> Result<Self> {
        conn.begin_transaction()?;
        Ok(Self { conn, open: true })
    }

    pub fn rollback(mut self) -> Result<()> {
        self.open = false;
        self.conn.rollback_transaction()
    }
}

impl<C: Connection + ?Sized> Deref for Transaction<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.conn
    }
}

impl<C: Connection + ?Sized> DerefMut for Transaction<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.conn
    }
}

impl<C: Connection + ?Sized> Drop for Transaction<'_, C> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.conn.rollback_transaction() {
                warn!(error = %err, "failed to roll back abandoned transaction");
            }
        }
    }
}

/// Run `body` inside a transaction and roll it back afterwards.
///
/// Only a failure to open the transaction is returned as the outer error.
/// A failed rollback shows up in the inner result, ahead of whatever the
/// body returned.
pub fn with_rollback<C, T, F>(conn: &mut C, body: F) -> Result<Result<T>>
where
    C: Connection + ?Sized,
    F: FnOnce(&mut C) -> Result<T>,
{
    let mut tx = Transaction::begin(conn)?;
    let value = body(&mut *tx);
    Ok(tx.rollback().and(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DumpError;

    #[test]
    fn test_filter_matches() {
        assert!(TriggerFilter::all().matches("anything"));

        let filter = TriggerFilter::only(["a", "b()"]).simple();
        assert!(filter.simple);
        assert!(filter.matches("b()"));
        assert!(!filter.matches("b"));
    }

    #[test]
    fn test_with_rollback_discards_changes() {
        let mut conn = MemoryConnection::new(AdapterKind::PostgreSQL);
        let result = with_rollback(&mut conn, |conn| {
            conn.execute("CREATE TRIGGER t1 AFTER INSERT ON users FOR EACH ROW")
        })
        .unwrap();

        assert!(result.is_ok());
        assert!(conn.triggers().is_empty());
        assert_eq!(conn.rollbacks(), 1);
    }

    #[test]
    fn test_with_rollback_returns_body_error_untouched() {
        let mut conn =
            MemoryConnection::new(AdapterKind::PostgreSQL).reject_statements_containing("t1");
        let result = with_rollback(&mut conn, |conn| {
            conn.execute("CREATE TRIGGER t1 AFTER INSERT ON users FOR EACH ROW")
        })
        .unwrap();

        assert!(matches!(result, Err(DumpError::Database { .. })));
        assert!(!conn.in_transaction());
    }

    #[test]
    fn test_with_rollback_folds_rollback_failure_into_body_result() {
        let mut conn = MemoryConnection::new(AdapterKind::PostgreSQL).fail_rollbacks();
        let result = with_rollback(&mut conn, |conn| {
            conn.execute("CREATE TRIGGER t1 AFTER INSERT ON users FOR EACH ROW")
        })
        .unwrap();

        assert!(matches!(result, Err(DumpError::Database { .. })));
    }

    #[test]
    fn test_with_rollback_begin_failure_is_outer_error() {
        let mut conn = MemoryConnection::new(AdapterKind::PostgreSQL).fail_transactions();
        let err = with_rollback(&mut conn, |_| Ok(())).unwrap_err();
        assert!(matches!(err, DumpError::Database { .. }));
    }

    #[test]
    fn test_dropped_guard_rolls_back() {
        let mut conn = MemoryConnection::new(AdapterKind::SQLite);
        {
            let mut tx = Transaction::begin(&mut conn).unwrap();
            tx.execute("CREATE TRIGGER t1 AFTER INSERT ON users FOR EACH ROW")
                .unwrap();
        }
        assert!(conn.triggers().is_empty());
        assert!(!conn.in_transaction());
    }

    #[test]
    fn test_rollback_without_transaction_is_misuse() {
        let mut conn = MemoryConnection::new(AdapterKind::MySQL);
        let err = conn.rollback_transaction().unwrap_err();
        assert!(matches!(err, DumpError::Transaction { .. }));
    }
}

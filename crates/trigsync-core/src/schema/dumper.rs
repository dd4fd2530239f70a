//! Trigger dump entry point

use std::io::Write;

use tracing::debug;

use crate::config::DumpOptions;
use crate::connection::{Connection, TriggerFilter};
use crate::error::Result;
use crate::migration::{MigrationOptions, MigrationSource};
use crate::output::write_trigger_section;
use crate::reconcile::{reconcile, MigrationTriggerSet, Reconciliation};
use crate::trigger::{filter_ignored_tables, Normalizer};

/// Runs reconciliation passes over one connection and migration source
pub struct TriggerDumper<'a, C: Connection + ?Sized, M: MigrationSource + ?Sized> {
    conn: &'a mut C,
    migrations: &'a M,
    options: DumpOptions,
}

impl<'a, C: Connection + ?Sized, M: MigrationSource + ?Sized> TriggerDumper<'a, C, M> {
    pub fn new(conn: &'a mut C, migrations: &'a M, options: DumpOptions) -> Self {
        Self {
            conn,
            migrations,
            options,
        }
    }

    /// Introspect, filter, and reconcile against the declared migrations
    pub fn reconcile(&mut self) -> Result<Reconciliation> {
        let all_triggers = self.conn.list_triggers(&TriggerFilter::all())?;
        let introspected = all_triggers.len();

        let conn = &*self.conn;
        let db_triggers = filter_ignored_tables(all_triggers, &self.options.ignore_tables, |table| {
            conn.quote_table_name(table)
        });
        debug!(
            adapter = %self.conn.adapter(),
            introspected,
            ignored = introspected - db_triggers.len(),
            "loaded database triggers"
        );

        let migration_options = MigrationOptions {
            in_schema_dump: true,
            previous_schema: self.options.previous_schema.clone(),
        };
        let sets: Vec<MigrationTriggerSet> = self
            .migrations
            .current_migrations(&migration_options)?
            .into_iter()
            .map(MigrationTriggerSet::from_migration)
            .collect();

        let mut normalizer = Normalizer::new(&mut *self.conn);
        reconcile(db_triggers, sets, &mut normalizer)
    }

    /// Run a pass and write the triggers section to `out`
    pub fn write_triggers<W>(&mut self, out: &mut W) -> Result<Reconciliation>
    where
        W: Write + ?Sized,
    {
        let reconciliation = self.reconcile()?;
        write_trigger_section(out, &reconciliation)?;
        Ok(reconciliation)
    }
}

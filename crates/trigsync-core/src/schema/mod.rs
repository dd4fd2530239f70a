//! Schema file composition

mod dumper;

use std::io::Write;

use crate::connection::Connection;
use crate::error::Result;
use crate::migration::MigrationSource;
use crate::reconcile::Reconciliation;

pub use dumper::TriggerDumper;

/// The schema-file writer the triggers section is inserted into
pub trait SchemaWriter {
    /// Preamble that opens the schema definition
    fn header(&mut self, out: &mut dyn Write) -> Result<()>;

    /// Table, index and constraint definitions
    fn tables(&mut self, out: &mut dyn Write) -> Result<()>;

    /// Closing boilerplate
    fn trailer(&mut self, out: &mut dyn Write) -> Result<()>;
}

/// Write a complete schema file: header, tables, triggers, trailer.
pub fn dump_schema<S, C, M>(
    writer: &mut S,
    triggers: &mut TriggerDumper<'_, C, M>,
    out: &mut dyn Write,
) -> Result<Reconciliation>
where
    S: SchemaWriter + ?Sized,
    C: Connection + ?Sized,
    M: MigrationSource + ?Sized,
{
    writer.header(out)?;
    writer.tables(out)?;
    let reconciliation = triggers.write_triggers(&mut *out)?;
    writer.trailer(out)?;
    Ok(reconciliation)
}

//! Output formatting

use std::io::Write;

use miette::{IntoDiagnostic, Result};
use trigsync_core::output::write_trigger_section;
use trigsync_core::Reconciliation;

use crate::args::OutputFormat;

/// Output formatter for a reconciled pass
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write the reconciliation in the configured format
    pub fn write(&self, out: &mut dyn Write, reconciliation: &Reconciliation) -> Result<()> {
        match self.format {
            OutputFormat::Schema => write_trigger_section(out, reconciliation).into_diagnostic(),
            OutputFormat::Json => self.write_json(out, reconciliation),
        }
    }

    fn write_json(&self, out: &mut dyn Write, reconciliation: &Reconciliation) -> Result<()> {
        let output = serde_json::json!({
            "confirmed": reconciliation.confirmed.len(),
            "orphaned": reconciliation.orphans.len(),
            "report": reconciliation.report(),
        });
        let rendered = serde_json::to_string_pretty(&output).into_diagnostic()?;
        writeln!(out, "{}", rendered).into_diagnostic()
    }
}

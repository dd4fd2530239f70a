//! Deterministic serializer for the schema file's triggers section

use std::io::Write;

use crate::migration::RenderOptions;
use crate::reconcile::Reconciliation;

/// Terminator of block-quoted multi-line statements
pub const HEREDOC_TERMINATOR: &str = "TRIGGERSQL";

/// Tool name used in the mismatch comment
const TOOL_NAME: &str = "trigsync";

/// Write the triggers section for a reconciled pass.
///
/// Orphans come first in sort-key order, each as a raw `execute` statement
/// preceded by a comment; confirmed builders follow in their declarative form.
pub fn write_trigger_section<W>(out: &mut W, reconciliation: &Reconciliation) -> std::io::Result<()>
where
    W: Write + ?Sized,
{
    for (name, definition) in reconciliation.sorted_orphans() {
        if reconciliation.is_mismatch(name) {
            writeln!(
                out,
                "  # WARNING: generating adapter-specific definition for {name} due to a mismatch."
            )?;
            writeln!(
                out,
                "  # either there's a bug in {TOOL_NAME} or you've messed up your migrations and/or db :-/"
            )?;
        } else {
            writeln!(
                out,
                "  # no candidate create_trigger statement could be found, creating an adapter-specific one"
            )?;
        }
        write!(out, "{}", execute_statement(definition))?;
    }

    let options = RenderOptions::schema_dump();
    for set in &reconciliation.confirmed {
        write!(out, "{}\n\n", set.builder.to_declarative_form(&options))?;
    }

    Ok(())
}

/// Raw `execute(...)` call for a statement, followed by a blank line
pub fn execute_statement(definition: &str) -> String {
    if definition.contains('\n') {
        format!(
            "  execute(<<-{HEREDOC_TERMINATOR})\n{}\n  {HEREDOC_TERMINATOR}\n\n",
            escape_heredoc(definition.trim_end())
        )
    } else {
        format!("  execute({})\n\n", quote_literal(definition))
    }
}

/// Double-quoted string literal with backslash escapes.
///
/// `#` is escaped before `{`, `$` and `@` so the literal never interpolates.
pub fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x0c' => out.push_str("\\f"),
            '\x0b' => out.push_str("\\v"),
            '\x08' => out.push_str("\\b"),
            '\x07' => out.push_str("\\a"),
            '\x1b' => out.push_str("\\e"),
            '#' if starts_interpolation(chars.peek()) => out.push_str("\\#"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Heredoc bodies interpolate like double-quoted literals, but keep their
/// line breaks and quotes as-is.
fn escape_heredoc(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '#' if starts_interpolation(chars.peek()) => out.push_str("\\#"),
            c => out.push(c),
        }
    }
    out
}

fn starts_interpolation(next: Option<&char>) -> bool {
    matches!(next, Some('{' | '$' | '@'))
}

//! Ignored-table filtering of introspected triggers

use tracing::debug;

use crate::connection::TriggerMap;

/// Drop every trigger whose source text attaches it to an ignored table.
///
/// A trigger is dropped when its text contains `ON`, whitespace, the table
/// name (either as quoted by `quote` or bare), and one more whitespace
/// character. This is a substring check on raw text, so unusual formatting
/// can let an ignored trigger through; it never fails.
pub fn filter_ignored_tables<F>(triggers: TriggerMap, ignore_tables: &[String], quote: F) -> TriggerMap
where
    F: Fn(&str) -> String,
{
    if ignore_tables.is_empty() {
        return triggers;
    }

    let table_refs: Vec<String> = ignore_tables
        .iter()
        .flat_map(|table| {
            let quoted = quote(table);
            if quoted == *table {
                vec![quoted]
            } else {
                vec![quoted, table.clone()]
            }
        })
        .collect();

    triggers
        .into_iter()
        .filter(|(name, source)| {
            let ignored = table_refs
                .iter()
                .any(|table_ref| references_table(source, table_ref));
            if ignored {
                debug!(trigger = %name, "skipping trigger on ignored table");
            }
            !ignored
        })
        .collect()
}

/// Whether `source` contains `ON<ws+><table_ref><ws>`
pub fn references_table(source: &str, table_ref: &str) -> bool {
    if table_ref.is_empty() {
        return false;
    }

    source.match_indices("ON").any(|(idx, keyword)| {
        let after = &source[idx + keyword.len()..];
        let name_start = after.trim_start_matches(is_sql_whitespace);
        if name_start.len() == after.len() {
            return false;
        }
        name_start
            .strip_prefix(table_ref)
            .and_then(|tail| tail.chars().next())
            .is_some_and(is_sql_whitespace)
    })
}

fn is_sql_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

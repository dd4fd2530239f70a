//! Definition extractor - recognises `CREATE ... TRIGGER` / `CREATE FUNCTION` headers

use super::{DefinitionKind, TriggerDefinition};

/// Extract the definitions created by a builder's generated statements.
///
/// Statements without a recognisable creation header (grants, comments,
/// `DROP ... IF EXISTS` preludes) are skipped.
pub fn extract_definitions<S: AsRef<str>>(statements: &[S]) -> Vec<TriggerDefinition> {
    statements
        .iter()
        .filter_map(|stmt| extract_definition(stmt.as_ref()))
        .collect()
}

/// Match the creation header of a single statement.
///
/// The header must sit on the first line: `CREATE`, then either anything up to
/// the last `TRIGGER` keyword on that line, or ` FUNCTION` directly; then a
/// space and the object name, which runs until the next space or line end.
pub fn extract_definition(statement: &str) -> Option<TriggerDefinition> {
    let header = statement.split('\n').next().unwrap_or_default();
    let rest = header.strip_prefix("CREATE")?;

    if let Some(name) = trigger_name(rest) {
        return Some(TriggerDefinition::new(
            name,
            statement,
            DefinitionKind::Trigger,
        ));
    }

    rest.strip_prefix(" FUNCTION ")
        .and_then(name_token)
        .map(|name| TriggerDefinition::new(name, statement, DefinitionKind::Function))
}

/// Rightmost `TRIGGER` on the header line that is followed by a name
fn trigger_name(rest: &str) -> Option<&str> {
    rest.rmatch_indices("TRIGGER").find_map(|(idx, keyword)| {
        rest[idx + keyword.len()..]
            .strip_prefix(' ')
            .and_then(name_token)
    })
}

fn name_token(s: &str) -> Option<&str> {
    let end = s.find(' ').unwrap_or(s.len());
    if end == 0 {
        None
    } else {
        Some(&s[..end])
    }
}

/// Split a SQL script into statements ready for [`extract_definition`].
///
/// Semicolons inside string literals, dollar-quoted bodies and comments do not
/// split. Comments and whitespace in front of a statement are dropped so that
/// every returned statement starts at its first keyword.
pub fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut pos = 0;

    while pos < sql.len() {
        pos = skip_leading_trivia(sql, pos);
        if pos >= sql.len() {
            break;
        }
        let end = statement_end(sql, pos);
        let stmt = sql[pos..end].trim_end();
        if !stmt.is_empty() {
            statements.push(stmt);
        }
        pos = end + 1;
    }

    statements
}

fn skip_leading_trivia(sql: &str, mut pos: usize) -> usize {
    loop {
        let rest = &sql[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();

        if trimmed.starts_with("--") {
            pos = skip_past(sql, pos + 2, "\n");
        } else if trimmed.starts_with("/*") {
            pos = skip_past(sql, pos + 2, "*/");
        } else {
            return pos;
        }
    }
}

/// Byte index of the `;` ending the statement at `start`, or the input length
fn statement_end(sql: &str, start: usize) -> usize {
    let bytes = sql.as_bytes();
    let mut i = start;

    while i < bytes.len() {
        i = match bytes[i] {
            b';' => return i,
            // a doubled '' closes and reopens, which skips the same span
            b'\'' => skip_past(sql, i + 1, "'"),
            b'$' => skip_dollar_quoted(sql, i),
            b'-' if bytes.get(i + 1) == Some(&b'-') => skip_past(sql, i + 2, "\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => skip_past(sql, i + 2, "*/"),
            _ => i + 1,
        };
    }

    bytes.len()
}

/// Skip a `$$ ... $$` or `$tag$ ... $tag$` body opened at `start`.
/// A lone `$` (e.g. a `$1` placeholder) only advances by one byte.
fn skip_dollar_quoted(sql: &str, start: usize) -> usize {
    let after = &sql[start + 1..];
    let tag_len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|&n| after[n..].starts_with('$'));

    match tag_len {
        Some(n) => {
            let tag = &sql[start..start + n + 2];
            skip_past(sql, start + tag.len(), tag)
        }
        None => start + 1,
    }
}

/// Index just past the next `terminator` at or after `from`; unterminated
/// constructs run to the end of input
fn skip_past(sql: &str, from: usize, terminator: &str) -> usize {
    sql[from..]
        .find(terminator)
        .map_or(sql.len(), |n| from + n + terminator.len())
}

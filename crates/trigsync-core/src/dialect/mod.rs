//! Database adapter identity

use serde::{Deserialize, Deserializer, Serialize};
use sqlparser::ast::{Ident, ObjectName};
use std::str::FromStr;

/// Supported database adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    PostgreSQL,
    MySQL,
    SQLite,
}

impl AdapterKind {
    /// Whether the database stores a rewritten form of trigger and function
    /// bodies instead of the statement that created them.
    ///
    /// PostgreSQL decompiles `pg_trigger`/`pg_proc` entries on the way out,
    /// so its introspection never echoes our generated text verbatim.
    pub fn rewrites_trigger_text(&self) -> bool {
        matches!(self, AdapterKind::PostgreSQL)
    }

    /// Identifier quote character for this adapter
    pub fn identifier_quote(&self) -> char {
        match self {
            AdapterKind::PostgreSQL | AdapterKind::SQLite => '"',
            AdapterKind::MySQL => '`',
        }
    }

    /// Quote a (possibly schema-qualified) table name
    pub fn quote_table_name(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        ObjectName(
            name.split('.')
                .map(|part| Ident::with_quote(quote, part))
                .collect(),
        )
        .to_string()
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" | "postgis" => Ok(AdapterKind::PostgreSQL),
            "mysql" | "mysql2" | "trilogy" => Ok(AdapterKind::MySQL),
            "sqlite" | "sqlite3" => Ok(AdapterKind::SQLite),
            _ => Err(format!(
                "Unknown adapter: '{}'. Supported adapters: postgresql, mysql, sqlite.",
                s
            )),
        }
    }
}

/// Accepts every spelling `FromStr` does, so snapshot files and `--adapter`
/// agree
impl<'de> Deserialize<'de> for AdapterKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::PostgreSQL => write!(f, "postgresql"),
            AdapterKind::MySQL => write!(f, "mysql"),
            AdapterKind::SQLite => write!(f, "sqlite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adapter_aliases() {
        assert_eq!("postgres".parse::<AdapterKind>(), Ok(AdapterKind::PostgreSQL));
        assert_eq!("PostGIS".parse::<AdapterKind>(), Ok(AdapterKind::PostgreSQL));
        assert_eq!("mysql2".parse::<AdapterKind>(), Ok(AdapterKind::MySQL));
        assert_eq!("sqlite3".parse::<AdapterKind>(), Ok(AdapterKind::SQLite));

        let err = "oracle".parse::<AdapterKind>().unwrap_err();
        assert!(err.contains("oracle"));
    }

    #[test]
    fn test_only_postgres_rewrites() {
        assert!(AdapterKind::PostgreSQL.rewrites_trigger_text());
        assert!(!AdapterKind::MySQL.rewrites_trigger_text());
        assert!(!AdapterKind::SQLite.rewrites_trigger_text());
    }

    #[test]
    fn test_quote_table_name() {
        assert_eq!(AdapterKind::PostgreSQL.quote_table_name("users"), "\"users\"");
        assert_eq!(
            AdapterKind::PostgreSQL.quote_table_name("audit.logs"),
            "\"audit\".\"logs\""
        );
        assert_eq!(AdapterKind::MySQL.quote_table_name("users"), "`users`");
        assert_eq!(AdapterKind::SQLite.quote_table_name("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_deserialize_accepts_parse_aliases() {
        for (json, expected) in [
            ("\"trilogy\"", AdapterKind::MySQL),
            ("\"PostGIS\"", AdapterKind::PostgreSQL),
            ("\"sqlite3\"", AdapterKind::SQLite),
        ] {
            assert_eq!(serde_json::from_str::<AdapterKind>(json).unwrap(), expected);
        }
        assert!(serde_json::from_str::<AdapterKind>("\"oracle\"").is_err());
        assert_eq!(
            serde_json::to_string(&AdapterKind::PostgreSQL).unwrap(),
            "\"postgresql\""
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for kind in [AdapterKind::PostgreSQL, AdapterKind::MySQL, AdapterKind::SQLite] {
            assert_eq!(kind.to_string().parse::<AdapterKind>(), Ok(kind));
        }
    }
}

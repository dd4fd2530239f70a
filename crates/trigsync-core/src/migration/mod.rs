//! Declared trigger builders and the migrations that supply them

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How a builder should render its declarative form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prefix for every emitted line
    pub indent: String,
    /// Single-line rendering instead of a block
    pub compact: bool,
    /// Include the builder's own warnings as comments
    pub show_warnings: bool,
}

impl RenderOptions {
    /// Options used when appending builders to a schema file.
    ///
    /// Warnings are suppressed: they were already shown when the migration ran.
    pub fn schema_dump() -> Self {
        Self {
            indent: "  ".to_string(),
            compact: false,
            show_warnings: false,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: String::new(),
            compact: false,
            show_warnings: true,
        }
    }
}

/// A declarative trigger description from the migration subsystem
pub trait TriggerBuilder {
    /// SQL statements that create this trigger and anything backing it
    fn generate(&self) -> Vec<String>;

    /// Canonical source rendering of the declaration
    fn to_declarative_form(&self, options: &RenderOptions) -> String;
}

/// Options passed to the migration source for a schema dump
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    pub in_schema_dump: bool,
    /// Schema file from the previous dump, if the source wants to diff against it
    pub previous_schema: Option<PathBuf>,
}

/// A builder together with the migration version that declared it
pub struct DeclaredMigration {
    pub version: String,
    pub builder: Box<dyn TriggerBuilder>,
}

impl std::fmt::Debug for DeclaredMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclaredMigration")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Supplies the currently declared trigger builders
pub trait MigrationSource {
    fn current_migrations(&self, options: &MigrationOptions) -> Result<Vec<DeclaredMigration>>;
}

/// A builder whose output was recorded ahead of time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticBuilder {
    /// Generated statements, in order
    pub statements: Vec<String>,
    /// Declarative rendering, unindented, one declaration line per line
    pub declarative: String,
    /// Warnings the builder reports about itself
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl StaticBuilder {
    pub fn new<I, S>(statements: I, declarative: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statements: statements.into_iter().map(Into::into).collect(),
            declarative: declarative.into(),
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

impl TriggerBuilder for StaticBuilder {
    fn generate(&self) -> Vec<String> {
        self.statements.clone()
    }

    fn to_declarative_form(&self, options: &RenderOptions) -> String {
        let mut lines = Vec::new();
        if options.show_warnings {
            for warning in &self.warnings {
                lines.push(format!("{}# WARNING: {}", options.indent, warning));
            }
        }

        if options.compact {
            let body = self
                .declarative
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("{}{}", options.indent, body));
        } else {
            for line in self.declarative.lines() {
                if line.trim().is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("{}{}", options.indent, line));
                }
            }
        }

        lines.join("\n")
    }
}

/// A recorded migration: version plus its builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMigration {
    pub version: String,
    #[serde(flatten)]
    pub builder: StaticBuilder,
}

impl MigrationSource for Vec<StaticMigration> {
    fn current_migrations(&self, _options: &MigrationOptions) -> Result<Vec<DeclaredMigration>> {
        Ok(self
            .iter()
            .map(|migration| DeclaredMigration {
                version: migration.version.clone(),
                builder: Box::new(migration.builder.clone()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> StaticBuilder {
        StaticBuilder::new(
            ["CREATE TRIGGER t1 AFTER INSERT ON users FOR EACH ROW EXECUTE PROCEDURE f()"],
            "trigger.after(:insert) do\n  \"UPDATE counts SET n = n + 1;\"\nend",
        )
        .with_warning("row-level trigger on MySQL")
    }

    #[test]
    fn test_schema_dump_rendering_is_indented_and_quiet() {
        let rendered = builder().to_declarative_form(&RenderOptions::schema_dump());
        assert_eq!(
            rendered,
            "  trigger.after(:insert) do\n    \"UPDATE counts SET n = n + 1;\"\n  end"
        );
    }

    #[test]
    fn test_warnings_follow_the_render_flag() {
        let options = RenderOptions {
            show_warnings: true,
            ..RenderOptions::schema_dump()
        };
        let rendered = builder().to_declarative_form(&options);
        assert!(rendered.starts_with("  # WARNING: row-level trigger on MySQL\n"));
    }

    #[test]
    fn test_compact_rendering() {
        let options = RenderOptions {
            compact: true,
            show_warnings: false,
            ..RenderOptions::default()
        };
        assert_eq!(
            builder().to_declarative_form(&options),
            "trigger.after(:insert) do \"UPDATE counts SET n = n + 1;\" end"
        );
    }

    #[test]
    fn test_static_migrations_as_source() {
        let migrations = vec![StaticMigration {
            version: "20240101000000".to_string(),
            builder: builder(),
        }];
        let declared = migrations
            .current_migrations(&MigrationOptions::default())
            .unwrap();
        assert_eq!(declared.len(), 1);
        assert_eq!(declared[0].version, "20240101000000");
        assert_eq!(declared[0].builder.generate().len(), 1);
    }
}

//! Reconciliation engine - matches declared trigger sets against the database

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::connection::TriggerMap;
use crate::error::Result;
use crate::migration::{DeclaredMigration, TriggerBuilder};
use crate::trigger::{extract_definitions, Normalize, TriggerDefinition};

/// Names for which a database candidate existed during matching
pub type WarningSet = IndexSet<String>;

/// One declared builder and the definitions it generates
pub struct MigrationTriggerSet {
    pub version: String,
    pub builder: Box<dyn TriggerBuilder>,
    pub definitions: Vec<TriggerDefinition>,
}

impl MigrationTriggerSet {
    pub fn from_migration(migration: DeclaredMigration) -> Self {
        let definitions = extract_definitions(&migration.builder.generate());
        Self {
            version: migration.version,
            builder: migration.builder,
            definitions,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|def| def.name.as_str())
    }
}

impl std::fmt::Debug for MigrationTriggerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationTriggerSet")
            .field("version", &self.version)
            .field("definitions", &self.definitions)
            .finish_non_exhaustive()
    }
}

/// Outcome of one reconciliation pass
#[derive(Debug)]
pub struct Reconciliation {
    /// Sets whose every definition is present, in input order
    pub confirmed: Vec<MigrationTriggerSet>,
    /// Database triggers no confirmed set accounts for
    pub orphans: TriggerMap,
    /// Names that had a candidate but ended up unclaimed
    pub warnings: WarningSet,
}

impl Reconciliation {
    /// Whether an orphan had a same-named declared definition that did not match
    pub fn is_mismatch(&self, name: &str) -> bool {
        self.warnings.contains(name)
    }

    /// Orphans in output order
    pub fn sorted_orphans(&self) -> Vec<(&str, &str)> {
        let mut orphans: Vec<(String, &str, &str)> = self
            .orphans
            .iter()
            .map(|(name, source)| (orphan_sort_key(name), name.as_str(), source.as_str()))
            .collect();
        orphans.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        orphans
            .into_iter()
            .map(|(_, name, source)| (name, source))
            .collect()
    }

    /// Names claimed by confirmed sets
    pub fn claimed_names(&self) -> IndexSet<&str> {
        self.confirmed.iter().flat_map(|set| set.names()).collect()
    }

    /// Serializable summary of the pass
    pub fn report(&self) -> ReconcileReport {
        ReconcileReport {
            confirmed: self.confirmed.iter().map(|set| set.version.clone()).collect(),
            orphans: self
                .sorted_orphans()
                .into_iter()
                .map(|(name, _)| OrphanReport {
                    name: name.to_string(),
                    mismatch: self.is_mismatch(name),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub confirmed: Vec<String>,
    pub orphans: Vec<OrphanReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    pub name: String,
    pub mismatch: bool,
}

/// Sort key for orphans.
///
/// A filler `a` is appended and the first `(` becomes `_`, so overloads of a
/// function (`foo(int)`, `foo(text)`) stay together ahead of plain `foo`.
pub fn orphan_sort_key(name: &str) -> String {
    format!("{name}a").replacen('(', "_", 1)
}

/// Claim database triggers for declared sets.
///
/// A set is confirmed only when every definition has a same-named database
/// entry equal to the normalized generated text; confirmed names leave the
/// orphan pool. Sets are considered in order, so the first confirmed set
/// claims a shared name.
pub fn reconcile<N>(
    mut db_triggers: TriggerMap,
    sets: Vec<MigrationTriggerSet>,
    normalizer: &mut N,
) -> Result<Reconciliation>
where
    N: Normalize + ?Sized,
{
    let declared = sets.len();
    let mut warnings = WarningSet::new();
    let mut confirmed = Vec::new();

    for set in sets {
        if !set_is_present(&set, &db_triggers, &mut warnings, normalizer)? {
            debug!(version = %set.version, "declared triggers not found in database");
            continue;
        }

        for name in set.names() {
            db_triggers.shift_remove(name);
            warnings.shift_remove(name);
        }
        confirmed.push(set);
    }

    debug!(
        declared,
        confirmed = confirmed.len(),
        orphans = db_triggers.len(),
        "reconciled triggers"
    );

    Ok(Reconciliation {
        confirmed,
        orphans: db_triggers,
        warnings,
    })
}

/// Checks definitions in order and stops at the first one that is missing or differs
fn set_is_present<N>(
    set: &MigrationTriggerSet,
    db_triggers: &TriggerMap,
    warnings: &mut WarningSet,
    normalizer: &mut N,
) -> Result<bool>
where
    N: Normalize + ?Sized,
{
    for def in &set.definitions {
        let Some(existing) = db_triggers.get(&def.name) else {
            return Ok(false);
        };
        warnings.insert(def.name.clone());
        if *existing != normalizer.normalize(def)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::StaticBuilder;
    use crate::trigger::Verbatim;

    fn set(version: &str, statements: &[&str]) -> MigrationTriggerSet {
        MigrationTriggerSet::from_migration(DeclaredMigration {
            version: version.to_string(),
            builder: Box::new(StaticBuilder::new(statements.iter().copied(), version)),
        })
    }

    fn db(entries: &[(&str, &str)]) -> TriggerMap {
        entries
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect()
    }

    const T1: &str = "CREATE TRIGGER t1 AFTER INSERT ON users FOR EACH ROW EXECUTE PROCEDURE f1()";
    const F1: &str = "CREATE FUNCTION f1()\nRETURNS TRIGGER AS $$ BEGIN RETURN NULL; END; $$";

    #[test]
    fn test_sort_key() {
        assert_eq!(orphan_sort_key("foo"), "fooa");
        assert_eq!(orphan_sort_key("foo()"), "foo_)a");
        assert_eq!(orphan_sort_key("f(a)(b)"), "f_a)(b)a");
    }

    #[test]
    fn test_sorted_orphans_order() {
        let reconciliation = Reconciliation {
            confirmed: Vec::new(),
            orphans: db(&[("foo_bar", "x"), ("foo()", "y"), ("foo", "z"), ("abc", "w")]),
            warnings: WarningSet::new(),
        };
        let names: Vec<&str> = reconciliation
            .sorted_orphans()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["abc", "foo()", "foo_bar", "foo"]);
    }

    #[test]
    fn test_full_match_claims_all_names() {
        let result = reconcile(
            db(&[("t1", T1), ("f1()", F1), ("other", "CREATE TRIGGER other")]),
            vec![set("1", &[F1, T1])],
            &mut Verbatim,
        )
        .unwrap();

        assert_eq!(result.confirmed.len(), 1);
        assert_eq!(result.orphans.keys().collect::<Vec<_>>(), vec!["other"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_partial_match_claims_nothing() {
        let changed_t1 = T1.replace("INSERT", "UPDATE");
        let result = reconcile(
            db(&[("t1", T1), ("f1()", F1)]),
            vec![set("1", &[F1, changed_t1.as_str()])],
            &mut Verbatim,
        )
        .unwrap();

        assert!(result.confirmed.is_empty());
        assert_eq!(result.orphans.len(), 2);
        assert!(result.is_mismatch("t1"));
        assert!(result.is_mismatch("f1()"));
    }

    #[test]
    fn test_missing_definition_stops_the_check() {
        let result = reconcile(
            db(&[("t1", T1)]),
            vec![set("1", &["CREATE TRIGGER gone AFTER DELETE ON users", T1])],
            &mut Verbatim,
        )
        .unwrap();

        assert!(result.confirmed.is_empty());
        assert!(!result.is_mismatch("t1"), "t1 was never checked");
    }

    #[test]
    fn test_first_confirmed_set_wins_shared_names() {
        let result = reconcile(
            db(&[("t1", T1)]),
            vec![set("1", &[T1]), set("2", &[T1])],
            &mut Verbatim,
        )
        .unwrap();

        let versions: Vec<&str> = result.confirmed.iter().map(|s| s.version.as_str()).collect();
        assert_eq!(versions, vec!["1"]);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_later_confirmation_clears_earlier_warning() {
        let stale = T1.replace("INSERT", "DELETE");
        let result = reconcile(
            db(&[("t1", T1)]),
            vec![set("old", &[stale.as_str()]), set("new", &[T1])],
            &mut Verbatim,
        )
        .unwrap();

        assert_eq!(result.confirmed.len(), 1);
        assert!(result.warnings.is_empty());
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_report() {
        let changed_t1 = T1.replace("f1()", "f2()");
        let result = reconcile(
            db(&[("t1", T1), ("zz", "CREATE TRIGGER zz")]),
            vec![set("1", &[changed_t1.as_str()]), set("2", &[])],
            &mut Verbatim,
        )
        .unwrap();

        let report = result.report();
        assert_eq!(report.confirmed, vec!["2".to_string()]);
        assert_eq!(
            report.orphans,
            vec![
                OrphanReport {
                    name: "t1".to_string(),
                    mismatch: true
                },
                OrphanReport {
                    name: "zz".to_string(),
                    mismatch: false
                },
            ]
        );
    }
}

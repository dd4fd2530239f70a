//! Trigger normalizer - brings generated definitions into the database's echo-back form

use rand::Rng;
use tracing::{trace, warn};

use super::{DefinitionKind, TriggerDefinition};
use crate::connection::{with_rollback, Connection, TriggerFilter};
use crate::error::{DumpError, Result};

/// Prefix of the throwaway objects created while probing
pub const PROBE_PREFIX: &str = "_trigsync_probe_";

const PROBE_SUFFIX_LEN: usize = 44;
const PROBE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789_";

/// Turns a generated definition into the text the database would report for it
pub trait Normalize {
    /// Only resource-level failures (e.g. a transaction that cannot be opened)
    /// are returned as errors.
    fn normalize(&mut self, definition: &TriggerDefinition) -> Result<String>;
}

/// Identity normalization, for databases that keep statements verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl Normalize for Verbatim {
    fn normalize(&mut self, definition: &TriggerDefinition) -> Result<String> {
        Ok(definition.statement.clone())
    }
}

/// Normalizer backed by a live connection.
///
/// On adapters that rewrite trigger text, the definition is created under a
/// random probe name inside a transaction, read back, and the transaction is
/// rolled back. Anything that goes wrong inside the probe, including the
/// rollback itself, leaves the definition unchanged.
pub struct Normalizer<'c, C: Connection + ?Sized> {
    conn: &'c mut C,
}

impl<'c, C: Connection + ?Sized> Normalizer<'c, C> {
    pub fn new(conn: &'c mut C) -> Self {
        Self { conn }
    }
}

impl<C: Connection + ?Sized> Normalize for Normalizer<'_, C> {
    fn normalize(&mut self, definition: &TriggerDefinition) -> Result<String> {
        if !self.conn.adapter().rewrites_trigger_text() {
            return Ok(definition.statement.clone());
        }

        let probe = probe_name(definition.kind);
        trace!(name = %definition.name, probe = %probe, "probing canonical definition");

        match with_rollback(&mut *self.conn, |conn| read_back(conn, definition, &probe))? {
            Ok(canonical) => Ok(canonical),
            Err(err) => {
                warn!(
                    name = %definition.name,
                    error = %err,
                    "could not probe definition, comparing generated text as-is"
                );
                Ok(definition.statement.clone())
            }
        }
    }
}

/// Random, fixed-length probe name; functions get `()` appended
pub fn probe_name(kind: DefinitionKind) -> String {
    let mut rng = rand::thread_rng();
    let mut name = String::with_capacity(PROBE_PREFIX.len() + PROBE_SUFFIX_LEN + 2);
    name.push_str(PROBE_PREFIX);
    name.extend(
        (0..PROBE_SUFFIX_LEN).map(|_| PROBE_CHARSET[rng.gen_range(0..PROBE_CHARSET.len())] as char),
    );
    if kind == DefinitionKind::Function {
        name.push_str("()");
    }
    name
}

fn read_back<C: Connection + ?Sized>(
    conn: &mut C,
    definition: &TriggerDefinition,
    probe: &str,
) -> Result<String> {
    conn.execute(&definition.statement.replacen(&definition.name, probe, 1))?;

    let echoed = conn
        .list_triggers(&TriggerFilter::only([probe]).simple())?
        .into_values()
        .next()
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            DumpError::database(
                "reading back probe definition",
                format!("{probe} was not found after creation"),
            )
        })?;

    Ok(echoed.replacen(probe, &definition.name, 1))
}

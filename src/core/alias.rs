//! Alias table: known OCR misreads mapped to canonical labels.
//!
//! Keys and targets are stored canonicalized, and chains are collapsed at
//! build time so resolution is always a single hop. The table is built once
//! and never written to while a scan runs.

use std::sync::OnceLock;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::text::canonicalize;

/// Misreads seen often enough on short item names to ship by default
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("5Plug", "SPlug"),
    ("SPluc", "SPlug"),
    ("5Pluc", "SPlug"),
    ("M.part5", "M.parts"),
    ("N.parts", "M.parts"),
    ("0.2BTG", "0.2BTC"),
    ("O.2BTC", "0.2BTC"),
    ("O.2BTG", "0.2BTC"),
    ("LEOX", "LEDX"),
    ("LEDK", "LEDX"),
    ("L3DX", "LEDX"),
    ("Tetr1z", "Tetriz"),
    ("Tetr1s", "Tetriz"),
    ("6P", "GP"),
    ("S1CC", "SICC"),
    ("AE5A", "AESA"),
    ("Tank 8att", "Tank batt"),
    ("R0ler", "Roler"),
    ("6PU", "GPU"),
    ("Tap3", "Tape"),
];

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AliasError
{
    #[error("alias key `{0}` normalizes to an empty label")]
    EmptyKey(String),

    #[error("alias `{key}` points at an empty target")]
    EmptyTarget
    {
        key: String,
    },

    #[error("alias chain starting at `{0}` loops back on itself")]
    Cycle(String),
}

/// Immutable noisy-label → canonical-label mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable
{
    map: IndexMap<String, String>,
}

impl AliasTable
{
    /// Process-wide built-in table, built on first use
    pub fn builtin() -> &'static AliasTable
    {
        static BUILTIN: OnceLock<AliasTable> = OnceLock::new();

        BUILTIN.get_or_init(|| {
            AliasTable::from_pairs(BUILTIN_ALIASES.iter().copied()).unwrap_or_else(|err| {
                warn!("built-in alias table rejected: {err}");
                AliasTable::default()
            })
        })
    }

    /// Build a table from raw `(noisy, canonical)` pairs.
    ///
    /// # Errors
    /// Fails on empty keys or targets and on alias cycles.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AliasError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = Self::default();
        table.extend(pairs)?;
        Ok(table)
    }

    /// Add pairs on top of the current table, re-collapsing chains.
    ///
    /// Later pairs override earlier ones for the same key. On error the
    /// table is left unchanged.
    pub fn extend<I, K, V>(
        &mut self,
        pairs: I,
    ) -> Result<(), AliasError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut staged = self
            .map
            .clone();

        for (key, target) in pairs
        {
            let key_c = canonicalize(key.as_ref());
            let target_c = canonicalize(target.as_ref());

            if key_c.is_empty()
            {
                return Err(AliasError::EmptyKey(
                    key.as_ref()
                        .to_string(),
                ));
            }

            if target_c.is_empty()
            {
                return Err(AliasError::EmptyTarget { key: key_c });
            }

            // Identity pairs carry no information
            if key_c == target_c
            {
                staged.shift_remove(&key_c);
                continue;
            }

            staged.insert(key_c, target_c);
        }

        self.map = collapse_chains(&staged)?;
        debug!(aliases = self.map.len(), "alias table rebuilt");
        Ok(())
    }

    /// Canonical target for an already-canonicalized label
    pub fn resolve(
        &self,
        canonical: &str,
    ) -> Option<&str>
    {
        self.map
            .get(canonical)
            .map(String::as_str)
    }

    pub fn len(&self) -> usize
    {
        self.map
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.map
            .is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)>
    {
        self.map
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Point every key straight at the end of its chain.
fn collapse_chains(map: &IndexMap<String, String>) -> Result<IndexMap<String, String>, AliasError>
{
    let mut out = IndexMap::with_capacity(map.len());

    for (key, first) in map
    {
        let mut target = first;
        let mut hops = 0usize;

        while let Some(next) = map.get(target)
        {
            hops += 1;

            // A chain longer than the table must revisit a key
            if next == key || hops > map.len()
            {
                return Err(AliasError::Cycle(key.clone()));
            }

            target = next;
        }

        out.insert(key.clone(), target.clone());
    }

    Ok(out)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn builtin_pairs_are_valid()
    {
        let table = AliasTable::from_pairs(BUILTIN_ALIASES.iter().copied());

        assert!(table.is_ok(), "{table:?}");
        assert_eq!(AliasTable::builtin().resolve("LEOX"), Some("LEDX"));
    }

    #[test]
    fn keys_and_targets_are_canonicalized()
    {
        let table = AliasTable::from_pairs([(" tank 8att ", "Tank batt")]).unwrap();

        assert_eq!(table.resolve("TANK8ATT"), Some("TANKBATT"));
    }

    #[test]
    fn chains_resolve_in_one_hop()
    {
        let table = AliasTable::from_pairs([("a", "b"), ("b", "c"), ("c", "d")]).unwrap();

        assert_eq!(table.resolve("A"), Some("D"));
        assert_eq!(table.resolve("B"), Some("D"));
        assert_eq!(table.resolve("C"), Some("D"));
        assert_eq!(table.resolve("D"), None);
    }

    #[test]
    fn cycles_are_rejected()
    {
        let err = AliasTable::from_pairs([("a", "b"), ("b", "a")]).unwrap_err();

        assert!(matches!(err, AliasError::Cycle(_)));
    }

    #[test]
    fn identity_pairs_are_dropped()
    {
        let table = AliasTable::from_pairs([("gpu", "GPU")]).unwrap();

        assert!(table.is_empty());
    }

    #[test]
    fn empty_key_or_target_is_an_error()
    {
        assert_eq!(
            AliasTable::from_pairs([(" . ", "GPU")]).unwrap_err(),
            AliasError::EmptyKey(" . ".to_string())
        );
        assert_eq!(
            AliasTable::from_pairs([("gpu", "")]).unwrap_err(),
            AliasError::EmptyTarget { key: "GPU".to_string() }
        );
    }

    #[test]
    fn failed_extend_leaves_table_untouched()
    {
        let mut table = AliasTable::from_pairs([("leox", "ledx")]).unwrap();
        let before = table.clone();

        assert!(
            table
                .extend([("ledx", "leox")])
                .is_err()
        );
        assert_eq!(table, before);
    }

    #[test]
    fn later_pairs_override_earlier_ones()
    {
        let mut table = AliasTable::from_pairs([("6p", "GP")]).unwrap();
        table
            .extend([("6p", "GPU")])
            .unwrap();

        assert_eq!(table.resolve("6P"), Some("GPU"));
    }
}

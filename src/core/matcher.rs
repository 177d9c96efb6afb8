//! Resolve normalized labels against the catalog into a counted inventory.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::alias::AliasTable;
use crate::core::catalog::{Catalog, ItemRecord};
use crate::core::text::{NormalizedLabel, normalize};

/// A catalog item recognized `count` times in one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedInventoryEntry
{
    pub item: ItemRecord,
    pub count: u32,
}

impl MatchedInventoryEntry
{
    pub fn new(
        item: ItemRecord,
        count: u32,
    ) -> Self
    {
        Self { item, count }
    }
}

/// Matcher output: what was recognized and what was not
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport
{
    /// Matched items in first-seen order
    pub inventory: Vec<MatchedInventoryEntry>,

    /// Unique unresolved labels in first-seen order
    pub unmatched: IndexSet<NormalizedLabel>,

    /// Tokens that landed in `unmatched`, repeats included
    pub unmatched_occurrences: usize,
}

impl MatchReport
{
    /// Sum of matched counts
    pub fn matched_units(&self) -> u64
    {
        self.inventory
            .iter()
            .map(|e| u64::from(e.count))
            .sum()
    }

    pub fn is_empty(&self) -> bool
    {
        self.inventory
            .is_empty()
            && self
                .unmatched
                .is_empty()
    }
}

/// Normalized-label lookup over one catalog snapshot.
///
/// Keys come from each record's short and display names, run through the
/// same normalizer as scanned tokens.
pub struct CatalogIndex<'a>
{
    records: Vec<&'a ItemRecord>,
    keys: HashMap<NormalizedLabel, usize>,
    aliases: &'a AliasTable,
}

impl<'a> CatalogIndex<'a>
{
    pub fn build(
        catalog: &'a Catalog,
        aliases: &'a AliasTable,
    ) -> Self
    {
        let records: Vec<&ItemRecord> = catalog
            .iter()
            .collect();
        let mut keys = HashMap::with_capacity(records.len() * 2);

        for (pos, record) in records
            .iter()
            .enumerate()
        {
            for name in [record.short_name.as_str(), record.display_name.as_str()]
            {
                let key = normalize(name, aliases);

                if key.is_empty()
                {
                    continue;
                }

                match keys.get(&key)
                {
                    None =>
                    {
                        keys.insert(key, pos);
                    }
                    Some(&owner) if owner != pos =>
                    {
                        debug!(
                            label = %key,
                            kept = %records[owner].id,
                            dropped = %record.id,
                            "label claimed by two catalog items"
                        );
                    }
                    Some(_) =>
                    {}
                }
            }
        }

        Self { records, keys, aliases }
    }

    /// Catalog record for an already-normalized label
    pub fn lookup(
        &self,
        label: &NormalizedLabel,
    ) -> Option<&'a ItemRecord>
    {
        self.keys
            .get(label)
            .map(|&pos| self.records[pos])
    }

    /// Tally raw tokens into a [`MatchReport`].
    pub fn match_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> MatchReport
    {
        let mut counts: IndexMap<usize, u32> = IndexMap::new();
        let mut report = MatchReport::default();

        for token in tokens
        {
            let label = normalize(token.as_ref(), self.aliases);

            // Nothing left after cleanup; carries no information
            if label.is_empty()
            {
                continue;
            }

            match self
                .keys
                .get(&label)
            {
                Some(&pos) =>
                {
                    *counts
                        .entry(pos)
                        .or_insert(0) += 1;
                }
                None =>
                {
                    report.unmatched_occurrences += 1;
                    report
                        .unmatched
                        .insert(label);
                }
            }
        }

        report.inventory = counts
            .into_iter()
            .map(|(pos, count)| MatchedInventoryEntry::new(self.records[pos].clone(), count))
            .collect();

        report
    }
}

/// Match raw tokens against `catalog`.
#[instrument(skip_all, fields(tokens = tokens.len(), catalog = catalog.len()))]
pub fn match_tokens<S: AsRef<str>>(
    tokens: &[S],
    catalog: &Catalog,
    aliases: &AliasTable,
) -> MatchReport
{
    let report = CatalogIndex::build(catalog, aliases).match_tokens(tokens);

    debug!(
        matched = report.inventory.len(),
        unmatched = report.unmatched.len(),
        "tokens matched"
    );

    report
}

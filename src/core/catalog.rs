//! Item catalog snapshot handed over by the pricing side.
//!
//! The engine only reads it. Records deserialize from the JSON the price
//! fetcher writes (camelCase, with a few legacy field names accepted).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Stable item identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId
{
    pub fn as_str(&self) -> &str
    {
        &self.0
    }
}

impl From<&str> for ItemId
{
    fn from(s: &str) -> Self
    {
        Self(s.to_string())
    }
}

impl From<String> for ItemId
{
    fn from(s: String) -> Self
    {
        Self(s)
    }
}

impl fmt::Display for ItemId
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

/// One purchasable item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord
{
    pub id: ItemId,

    /// Full in-game name
    #[serde(alias = "name")]
    pub display_name: String,

    /// Short label as printed on inventory tiles
    #[serde(default)]
    pub short_name: String,

    /// Ritual-relevant value; `None` when the feed left it out
    #[serde(default, alias = "basePrice")]
    pub reference_value: Option<u64>,

    /// What the player pays; falls back to the reference value
    #[serde(default, alias = "price", skip_serializing_if = "Option::is_none")]
    pub acquisition_cost: Option<u64>,
}

impl ItemRecord
{
    pub fn new(
        id: impl Into<ItemId>,
        display_name: impl Into<String>,
        reference_value: u64,
    ) -> Self
    {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            short_name: String::new(),
            reference_value: Some(reference_value),
            acquisition_cost: None,
        }
    }

    pub fn with_short_name(
        mut self,
        short_name: impl Into<String>,
    ) -> Self
    {
        self.short_name = short_name.into();
        self
    }

    pub fn with_cost(
        mut self,
        cost: u64,
    ) -> Self
    {
        self.acquisition_cost = Some(cost);
        self
    }

    /// Reference value, 0 when missing
    pub fn value(&self) -> u64
    {
        self.reference_value
            .unwrap_or(0)
    }

    /// Effective acquisition cost
    pub fn cost(&self) -> u64
    {
        self.acquisition_cost
            .unwrap_or_else(|| self.value())
    }

    /// Short name when present, else the display name
    pub fn label(&self) -> &str
    {
        if self
            .short_name
            .is_empty()
        {
            &self.display_name
        }
        else
        {
            &self.short_name
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile
{
    Bare(Vec<ItemRecord>),
    Wrapped
    {
        items: Vec<ItemRecord>,
    },
}

/// Read-only snapshot of the current item list, keyed by id
#[derive(Debug, Clone, Default)]
pub struct Catalog
{
    items: IndexMap<ItemId, ItemRecord>,
}

impl Catalog
{
    /// Build a snapshot. Duplicate ids keep the first record.
    pub fn new(records: impl IntoIterator<Item = ItemRecord>) -> Self
    {
        let mut items = IndexMap::new();

        for record in records
        {
            if record
                .reference_value
                .is_none()
            {
                warn!(id = %record.id, "catalog item has no reference value; treating it as 0");
            }

            if items.contains_key(&record.id)
            {
                debug!(id = %record.id, "duplicate catalog id ignored");
                continue;
            }

            items.insert(record.id.clone(), record);
        }

        Self { items }
    }

    /// Parse either a bare JSON array or `{ "items": [...] }`
    pub fn from_json(json: &str) -> serde_json::Result<Self>
    {
        let file: CatalogFile = serde_json::from_str(json)?;

        let records = match file
        {
            CatalogFile::Bare(items) | CatalogFile::Wrapped { items } => items,
        };

        Ok(Self::new(records))
    }

    pub fn get(
        &self,
        id: &ItemId,
    ) -> Option<&ItemRecord>
    {
        self.items
            .get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemRecord>
    {
        self.items
            .values()
    }

    pub fn len(&self) -> usize
    {
        self.items
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.items
            .is_empty()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn cost_falls_back_to_reference_value()
    {
        let plain = ItemRecord::new("1", "Spark plug", 15_000);
        let priced = ItemRecord::new("2", "Tape", 20_000).with_cost(9_000);

        assert_eq!(plain.cost(), 15_000);
        assert_eq!(priced.cost(), 9_000);
    }

    #[test]
    fn parses_bare_and_wrapped_json()
    {
        let bare = r#"[{"id":"1","displayName":"Spark plug","shortName":"SPlug","referenceValue":15000}]"#;
        let wrapped = r#"{"items":[{"id":"1","name":"Spark plug","basePrice":15000,"price":9000}]}"#;

        let a = Catalog::from_json(bare).unwrap();
        let b = Catalog::from_json(wrapped).unwrap();

        let id = ItemId::from("1");
        assert_eq!(a.get(&id).unwrap().label(), "SPlug");
        assert_eq!(b.get(&id).unwrap().cost(), 9_000);
        assert_eq!(b.get(&id).unwrap().label(), "Spark plug");
    }

    #[test]
    fn missing_reference_value_counts_as_zero()
    {
        let catalog = Catalog::from_json(r#"[{"id":"x","displayName":"Mystery"}]"#).unwrap();
        let item = catalog
            .get(&ItemId::from("x"))
            .unwrap();

        assert_eq!(item.value(), 0);
        assert_eq!(item.cost(), 0);
    }

    #[test]
    fn duplicate_ids_keep_first_record()
    {
        let catalog = Catalog::new([
            ItemRecord::new("1", "First", 10),
            ItemRecord::new("1", "Second", 20),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&ItemId::from("1")).unwrap().display_name, "First");
    }
}

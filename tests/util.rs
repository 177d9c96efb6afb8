//! Shared test utilities for integration tests
//!
//! Inventory builders and on-disk fixtures used across test files.

#![allow(dead_code)]

use assert_fs::prelude::*;
use cultist_circle::ComboResult;
use cultist_circle::core::{ItemRecord, MatchedInventoryEntry};

pub const CATALOG_JSON: &str = include_str!("fixtures/catalog.json");
pub const SCAN_TEXT: &str = include_str!("fixtures/scan.txt");

/// Entry whose cost equals its value
pub fn entry(
    id: &str,
    value: u64,
    count: u32,
) -> MatchedInventoryEntry
{
    MatchedInventoryEntry::new(ItemRecord::new(id, id, value), count)
}

/// Entry with an explicit acquisition cost
pub fn priced(
    id: &str,
    value: u64,
    cost: u64,
    count: u32,
) -> MatchedInventoryEntry
{
    MatchedInventoryEntry::new(ItemRecord::new(id, id, value).with_cost(cost), count)
}

/// Item ids in result order
pub fn ids(result: &ComboResult) -> Vec<&str>
{
    result
        .items
        .iter()
        .map(|item| {
            item.id
                .as_str()
        })
        .collect()
}

/// Temp dir holding the bundled catalog and scan text
pub fn make_scan_fixture() -> assert_fs::TempDir
{
    // Initialize the temporary working directory
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("catalog.json")
        .write_str(CATALOG_JSON)
        .expect("write catalog");

    tmp.child("scan.txt")
        .write_str(SCAN_TEXT)
        .expect("write scan");

    tmp
}

//! Tokenizer and normalizer for OCR-scanned inventory text.
//!
//! Scanners hand us short item names with stray periods, spaces and case
//! noise (`M.parts`, ` S Plug `). Everything here is pure and total: any
//! input string yields a defined, possibly empty, label.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::alias::AliasTable;

/// Separators scanners tend to inject into short item names
const SCAN_SEPARATORS: &[char] = &['.', ',', '\'', '`', '"', '-', '_', '·', '|', ':', ';'];

/// Canonical, alias-resolved label derived from one raw token
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedLabel(String);

impl NormalizedLabel
{
    pub fn as_str(&self) -> &str
    {
        &self.0
    }

    pub fn is_empty(&self) -> bool
    {
        self.0
            .is_empty()
    }

    pub fn into_string(self) -> String
    {
        self.0
    }
}

impl fmt::Display for NormalizedLabel
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedLabel
{
    fn as_ref(&self) -> &str
    {
        &self.0
    }
}

impl Borrow<str> for NormalizedLabel
{
    fn borrow(&self) -> &str
    {
        &self.0
    }
}

/// Split raw scanned text into candidate labels.
///
/// Runs of any Unicode whitespace (spaces, tabs, `\n`, `\r\n`) separate
/// tokens. Whitespace-only input yields an empty vector.
pub fn tokenize(raw: &str) -> Vec<&str>
{
    raw.split_whitespace()
        .collect()
}

/// Steps 1-3 of normalization: trim, strip scan separators, upper-case.
///
/// Alias keys and targets are stored in this form, which keeps
/// [`normalize`] idempotent.
pub fn canonicalize(token: &str) -> String
{
    token
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !SCAN_SEPARATORS.contains(c))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Canonicalize `token` and resolve it through the alias table.
pub fn normalize(
    token: &str,
    aliases: &AliasTable,
) -> NormalizedLabel
{
    let canonical = canonicalize(token);

    match aliases.resolve(&canonical)
    {
        Some(target) => NormalizedLabel(target.to_string()),
        None => NormalizedLabel(canonical),
    }
}

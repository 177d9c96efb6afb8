use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use memmap2::Mmap;
use serde::Deserialize;
use tracing::debug;

use crate::core::catalog::Catalog;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

pub enum FileContent
{
    Mapped(Mmap),
    Buffered(String),
}

impl FileContent
{
    /// View the content as UTF-8
    pub fn as_str(&self) -> Result<&str>
    {
        match self
        {
            FileContent::Mapped(mmap) => std::str::from_utf8(mmap).context("file is not valid UTF-8"),
            FileContent::Buffered(s) => Ok(s.as_str()),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent>
{
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD
    {
        // Large catalogs and scan dumps
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: read-only mapping; we never write to the file while it is mapped
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    }
    else
    {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}

/// Expand `~` and `$VAR` in a user-supplied path
pub fn expand_path(path: &Path) -> Result<PathBuf>
{
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path {}", path.display()))?;

    Ok(PathBuf::from(expanded.into_owned()))
}

/// Raw OCR text from a file, or stdin when `input` is `-`
pub fn read_scan_text(input: &Path) -> Result<String>
{
    if input == Path::new("-")
    {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read scan text from stdin")?;
        return Ok(text);
    }

    let path = expand_path(input)?;
    let content = read_file_smart(&path)?;

    Ok(content
        .as_str()
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .to_string())
}

pub fn load_catalog(path: &Path) -> Result<Catalog>
{
    let path = expand_path(path)?;
    let content = read_file_smart(&path)?;
    let json = content
        .as_str()
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let catalog = Catalog::from_json(json)
        .with_context(|| format!("Failed to parse catalog {}", path.display()))?;

    debug!(items = catalog.len(), path = %path.display(), "catalog loaded");
    Ok(catalog)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AliasFile
{
    Sectioned
    {
        aliases: IndexMap<String, String>,
    },
    Flat(IndexMap<String, String>),
}

/// Alias pairs from a TOML or JSON file.
///
/// Accepts either an `aliases` table/object or top-level pairs.
pub fn load_alias_file(path: &Path) -> Result<IndexMap<String, String>>
{
    let path = expand_path(path)?;
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read alias file {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let file: AliasFile = if is_json
    {
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse alias file {}", path.display()))?
    }
    else
    {
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse alias file {}", path.display()))?
    };

    let pairs = match file
    {
        AliasFile::Sectioned { aliases } | AliasFile::Flat(aliases) => aliases,
    };

    Ok(pairs)
}

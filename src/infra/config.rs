use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::selector::{DEFAULT_MAX_SLOTS, DEFAULT_THRESHOLD};

/// Config file names, first hit wins
const CONFIG_FILES: [&str; 4] = ["circle.toml", "circle.yaml", "circle.json", ".circle.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Minimum summed reference value for a qualifying sacrifice
    pub threshold: u64,

    /// Ritual slots
    pub max_slots: usize,

    /// Item catalog JSON written by the price fetcher
    pub catalog: Option<PathBuf>,

    /// Extra alias file (TOML or JSON) layered over the built-in table
    pub aliases_file: Option<PathBuf>,

    /// Split the search across threads
    pub parallel: bool,

    /// Inline aliases, applied last
    pub aliases: IndexMap<String, String>,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_slots: DEFAULT_MAX_SLOTS,
            catalog: None,
            aliases_file: None,
            parallel: false,
            aliases: IndexMap::new(),
        }
    }
}

pub fn load_config() -> Result<Config>
{
    load_config_in(Path::new("."))
}

/// Load the first config file found in `root`, then `CIRCLE_*` env vars.
pub fn load_config_in(root: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in CONFIG_FILES
    {
        let path = root.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // CIRCLE_MAX_SLOTS would split on a single underscore
    builder = builder.add_source(
        config::Environment::with_prefix("CIRCLE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("circle.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use assert_fs::prelude::*;

    use super::*;

    #[test]
    fn defaults_match_the_ritual()
    {
        let config = Config::default();

        assert_eq!(config.threshold, 400_000);
        assert_eq!(config.max_slots, 5);
        assert!(!config.parallel);
    }

    #[test]
    fn reads_toml_with_inline_aliases()
    {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("circle.toml")
            .write_str(
                "threshold = 350000\nmax_slots = 4\ncatalog = \"items.json\"\n\n[aliases]\n\"6PU\" = \"GPU\"\n",
            )
            .unwrap();

        let config = load_config_in(dir.path()).unwrap();

        assert_eq!(config.threshold, 350_000);
        assert_eq!(config.max_slots, 4);
        assert_eq!(config.catalog, Some(PathBuf::from("items.json")));
        // Key case is irrelevant once aliases are canonicalized
        assert!(
            config
                .aliases
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case("6PU") && v == "GPU")
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults()
    {
        let dir = assert_fs::TempDir::new().unwrap();

        let config = load_config_in(dir.path()).unwrap();

        assert_eq!(config.max_slots, DEFAULT_MAX_SLOTS);
    }

    #[test]
    fn default_config_round_trips_through_toml()
    {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();

        assert_eq!(back, Config::default());
    }
}

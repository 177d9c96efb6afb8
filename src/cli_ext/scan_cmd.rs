//! `scan`, `match`, and `normalize` subcommands.

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{AppContext, MatchArgs, NormalizeArgs, OutputFormat, ScanArgs, SourceArgs};
use crate::cli_ext::report::{MatchSummary, ScanReport};
use crate::core::alias::AliasTable;
use crate::core::catalog::{Catalog, ItemId};
use crate::core::matcher::{MatchReport, match_tokens};
use crate::core::selector::CancelToken;
use crate::core::session::SelectionJob;
use crate::core::text::{normalize, tokenize};
use crate::infra::config::{Config, load_config};
use crate::infra::io::{load_alias_file, load_catalog, read_scan_text};

/// Catalog and alias table resolved from flags and config
struct Sources
{
    catalog: Catalog,
    aliases: AliasTable,
}

impl Sources
{
    fn load(
        args: &SourceArgs,
        config: &Config,
    ) -> Result<Self>
    {
        let path = args
            .catalog
            .as_ref()
            .or(config
                .catalog
                .as_ref())
            .context("No catalog given: pass --catalog or set `catalog` in circle.toml")?;

        let catalog = load_catalog(path)?;
        let aliases = build_aliases(args.aliases.as_deref(), config)?;

        Ok(Self { catalog, aliases })
    }

    fn match_text(
        &self,
        text: &str,
    ) -> MatchReport
    {
        match_tokens(&tokenize(text), &self.catalog, &self.aliases)
    }
}

/// Built-in aliases, then the alias file, then inline config pairs
fn build_aliases(
    file: Option<&std::path::Path>,
    config: &Config,
) -> Result<AliasTable>
{
    let mut aliases = AliasTable::builtin().clone();

    if let Some(path) = file.or(config
        .aliases_file
        .as_deref())
    {
        let pairs = load_alias_file(path)?;
        aliases
            .extend(pairs)
            .with_context(|| format!("Invalid aliases in {}", path.display()))?;
    }

    aliases
        .extend(config.aliases.iter())
        .context("Invalid inline aliases in config")?;

    Ok(aliases)
}

/// Config from disk, or defaults with a warning
fn config_or_default() -> Config
{
    load_config().unwrap_or_else(|e| {
        warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    })
}

fn spinner(
    ctx: &AppContext,
    format: OutputFormat,
) -> ProgressBar
{
    if ctx.quiet || format == OutputFormat::Json
    {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Searching combinations");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn scan_run(
    args: ScanArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = config_or_default();
    let sources = Sources::load(&args.sources, &config)?;
    let text = read_scan_text(&args.input)?;
    let report = sources.match_text(&text);

    let threshold = args
        .threshold
        .unwrap_or(config.threshold);
    let max_slots = args
        .slots
        .unwrap_or(config.max_slots);

    let job = SelectionJob {
        threshold,
        max_slots,
        excluded: args
            .exclude
            .into_iter()
            .map(ItemId::from)
            .collect(),
        pinned: args
            .pin
            .into_iter()
            .map(ItemId::from)
            .collect(),
        parallel: args.parallel || config.parallel,
        ..SelectionJob::new(report.inventory.clone())
    };

    // Single run in this thread; nothing else submits jobs
    let pb = spinner(ctx, args.format);
    let outcome = job.run(&CancelToken::new());
    pb.finish_and_clear();

    let combo = outcome.context("Selection failed")?;

    info!(
        matched = report.inventory.len(),
        selected = combo
            .as_ref()
            .map_or(0, |c| c.len()),
        "scan finished"
    );

    let view = ScanReport::new(&report, combo.as_ref(), threshold, max_slots);

    match args.format
    {
        OutputFormat::Json => println!("{}", view.to_json()?),
        OutputFormat::Table => println!("{}", view.render_table(ctx)),
        OutputFormat::Text => print!("{}", view.render_text(ctx)),
    }

    Ok(())
}

pub fn match_run(
    args: MatchArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config = config_or_default();
    let sources = Sources::load(&args.sources, &config)?;
    let text = read_scan_text(&args.input)?;
    let summary = MatchSummary::new(&sources.match_text(&text));

    match args.format
    {
        OutputFormat::Json => println!("{}", summary.to_json()?),
        OutputFormat::Table => println!("{}", summary.render_table()),
        OutputFormat::Text => print!("{}", summary.render_text(ctx)),
    }

    Ok(())
}

#[derive(Serialize)]
struct NormalizedToken<'a>
{
    token: &'a str,
    label: String,
}

pub fn normalize_run(
    args: NormalizeArgs,
    _ctx: &AppContext,
) -> Result<()>
{
    let config = config_or_default();
    let aliases = build_aliases(args.aliases.as_deref(), &config)?;

    let rows: Vec<NormalizedToken> = args
        .tokens
        .iter()
        .map(|token| NormalizedToken {
            token,
            label: normalize(token, &aliases).into_string(),
        })
        .collect();

    if args.json
    {
        println!("{}", serde_json::to_string(&rows)?);
        return Ok(());
    }

    for row in rows
    {
        println!("{}\t{}", row.token, row.label);
    }

    Ok(())
}

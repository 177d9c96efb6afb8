use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub verbose: bool,  // global --verbose
}

#[derive(Parser)]
#[command(name = "circle")]
#[command(
    about = "Pick the cheapest Cultist Circle sacrifice from scanned inventory text"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress spinners and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log engine decisions to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match scanned text against the catalog and pick a sacrifice
    Scan(ScanArgs),

    /// Match scanned text against the catalog without selecting
    Match(MatchArgs),

    /// Show how tokens normalize (alias table included)
    Normalize(NormalizeArgs),

    /// Initialize a circle.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where the catalog and extra aliases come from
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Item catalog JSON (overrides `catalog` in circle.toml)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Extra alias file, TOML or JSON (overrides `aliases_file`)
    #[arg(long, value_name = "FILE")]
    pub aliases: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Table of selected items
    Table,
    /// Single-line JSON
    Json,
}

#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Scanned text file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Minimum total reference value
    #[arg(short, long)]
    pub threshold: Option<u64>,

    /// Number of ritual slots
    #[arg(short, long)]
    pub slots: Option<usize>,

    /// Item id to leave out of auto-select (repeatable)
    #[arg(long, value_name = "ID")]
    pub exclude: Vec<String>,

    /// Item id to force into the sacrifice (repeatable; repeat to pin more units)
    #[arg(long, value_name = "ID")]
    pub pin: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Split the search across threads
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Parser, Debug)]
pub struct MatchArgs {
    /// Scanned text file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// Raw tokens to normalize
    #[arg(value_name = "TOKEN", required = true)]
    pub tokens: Vec<String>,

    /// Extra alias file, TOML or JSON
    #[arg(long, value_name = "FILE")]
    pub aliases: Option<PathBuf>,

    /// Emit JSON output (single-line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

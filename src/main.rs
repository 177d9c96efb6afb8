use anyhow::Result;
use clap::Parser;
use cultist_circle::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(ctx: &AppContext) {
    // RUST_LOG wins over --verbose
    let fallback = if ctx.verbose { "cultist_circle=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!ctx.no_color)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        verbose: cli.verbose,
    };

    init_tracing(&ctx);

    match cli.command {
        Commands::Scan(args) => cultist_circle::scan_run(args, &ctx),
        Commands::Match(args) => cultist_circle::match_run(args, &ctx),
        Commands::Normalize(args) => cultist_circle::normalize_run(args, &ctx),
        Commands::Init(args) => cultist_circle::infra::config::init(args, &ctx),
        Commands::Completions(args) => cultist_circle::completion::run(args, &ctx),
    }
}

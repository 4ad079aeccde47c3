//! seo-booster - local heuristic SEO analysis CLI

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seo_booster::cli::{Cli, Commands, ConfigCommands};
use seo_booster::error::Result;

mod commands;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("  {} {}", "Hint:".yellow(), hint);
        }
        std::process::exit(1);
    }
}

/// Log to stderr so `--json` output stays clean.
///
/// SEO_BOOSTER_LOG wins over RUST_LOG; otherwise `--verbose` selects debug.
fn setup_logging(verbose: bool) {
    let default = if verbose { "seo_booster=debug" } else { "warn" };
    let filter = std::env::var("SEO_BOOSTER_LOG")
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            url,
            keyword,
            competitor,
            json,
        } => commands::cmd_scan(&url, keyword.as_deref(), competitor.as_deref(), json),
        Commands::Terms { url, top, json } => commands::cmd_terms(&url, top, json),

        Commands::Config(ConfigCommands::Show) => commands::cmd_config_show(),
        Commands::Config(ConfigCommands::Path) => commands::cmd_config_path(),
        Commands::Config(ConfigCommands::Init { force }) => commands::cmd_config_init(force),

        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}

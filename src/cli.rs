use clap::{Parser, Subcommand, ValueEnum};

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "seo-booster")]
#[command(author, version, about = "Local heuristic SEO analysis for a single page", long_about = None)]
#[command(after_help = r#"Examples:
  seo-booster scan https://example.com                        Score a page
  seo-booster scan https://example.com --keyword "rust tools" Score with a target keyword
  seo-booster scan https://a.com --competitor https://b.com   Compare against a competitor
  seo-booster terms https://example.com                       Show the page's top terms
  seo-booster config init                                     Write a default config file
"#)]
pub struct Cli {
    /// Log progress to stderr (overridden by SEO_BOOSTER_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a page and list issues and tips
    #[command(after_help = r#"Examples:
  seo-booster scan https://example.com
  seo-booster scan https://example.com --keyword "garden tips"
  seo-booster scan https://example.com --competitor https://rival.com --json
"#)]
    Scan {
        /// Page to analyse (http or https)
        url: String,

        /// Target keyword or phrase
        #[arg(short, long)]
        keyword: Option<String>,

        /// Competitor page to compare against
        #[arg(short, long)]
        competitor: Option<String>,

        /// Output the JSON payload instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Show the highest-ranked terms on a page
    Terms {
        /// Page to analyse (http or https)
        url: String,

        /// Number of terms to show
        #[arg(long, default_value = "10")]
        top: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(after_help = r#"Examples:
  seo-booster completions bash > ~/.local/share/bash-completion/completions/seo-booster
  seo-booster completions zsh > ~/.zfunc/_seo-booster
  seo-booster completions fish > ~/.config/fish/completions/seo-booster.fish
"#)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

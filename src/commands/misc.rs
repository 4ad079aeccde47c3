use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;

use seo_booster::cli::{Cli, CompletionShell};
use seo_booster::config::Config;
use seo_booster::error::{Result, ScanError};

pub fn cmd_config_show() -> Result<()> {
    let config = Config::load()?;
    let content = toml::to_string_pretty(&config).map_err(|e| ScanError::Config(e.to_string()))?;
    print!("{}", content);
    Ok(())
}

pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

pub fn cmd_config_init(force: bool) -> Result<()> {
    let path = Config::config_path()?;
    if path.exists() && !force {
        return Err(ScanError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Config::default().save_to(&path)?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

/// Generate shell completions
pub fn cmd_completions(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut cmd, "seo-booster", &mut io::stdout());
    Ok(())
}

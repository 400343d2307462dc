//! Command-line interface for tutils.
//!
//! Run without arguments, `tutils` shows the main menu. Every helper is also
//! reachable directly as a subcommand:
//!
//! | Command | Helper |
//! |---------|--------|
//! | `tutils ssh` | SSH server manager (`list`, `add`, `remove`, `connect`, `clear-known-hosts`) |
//! | `tutils pr` | create and merge a GitHub pull request |
//! | `tutils bump [major\|minor\|patch]` | bump the project version |
//! | `tutils update [--force]` | check GitHub for a newer release |
//! | `tutils install` | download the latest release and add it to PATH |
//! | `tutils config` | show or create the configuration file |
//!
//! # Global options
//!
//! - `-v, --verbose`: debug logging
//! - `-q, --quiet`: errors only, no progress bars or update notices
//! - `-c, --config <PATH>`: config file (also `TUTILS_CONFIG`)
//!
//! `RUST_LOG` takes precedence over `--verbose`/`--quiet` when set.
//!
//! Menus read numbered answers from stdin, so every interactive path can be
//! scripted by piping input in.

mod bump;
mod config;
mod install;
mod menu;
mod pr;
pub mod prompt;
mod ssh;
mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{CONFIG_ENV, DataPaths, ToolConfig};
use crate::update::{GitHubReleases, UpdateChecker, pending_notice};
use prompt::Prompter;

/// Where a helper leaves the user when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Show the main menu again
    Back,
    /// Exit
    Done,
}

#[derive(Parser, Debug)]
#[command(
    name = "tutils",
    about = "Interactive terminal helpers for SSH, GitHub pull requests and version bumps",
    version,
    author,
    long_about = "tutils bundles small interactive helpers: an SSH server manager, a GitHub \
                  pull request helper, a project version bumper and an update checker. \
                  Run it without arguments for the main menu."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage saved SSH servers and connect to them
    Ssh(ssh::SshCommand),

    /// Create and merge a GitHub pull request
    Pr(pr::PrCommand),

    /// Bump the version of the project in the current directory
    Bump(bump::BumpCommand),

    /// Check GitHub for a newer release
    Update(update::UpdateCommand),

    /// Download the latest release and add it to PATH
    Install(install::InstallCommand),

    /// Show or create the configuration file
    Config(config::ConfigCommand),
}

/// Everything a helper needs besides the terminal.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: ToolConfig,
    pub config_path: PathBuf,
    pub paths: DataPaths,
    pub quiet: bool,
}

impl AppContext {
    pub async fn load(config_path: Option<PathBuf>, quiet: bool) -> Result<Self> {
        let config_path = match config_path {
            Some(p) => p,
            None => ToolConfig::default_path()?,
        };
        let config = ToolConfig::load_with_optional(Some(config_path.clone())).await?;
        let paths = config.paths()?;
        tracing::debug!("Data directory: {}", paths.root.display());
        Ok(Self {
            config,
            config_path,
            paths,
            quiet,
        })
    }

    pub fn release_source(&self) -> Result<GitHubReleases> {
        GitHubReleases::new(&self.config.release_owner, &self.config.release_repo)
    }

    pub fn update_checker(&self) -> Result<UpdateChecker<GitHubReleases>> {
        Ok(UpdateChecker::new(self.release_source()?, &self.paths).with_ttl(self.config.update_ttl_secs))
    }

    /// Silent update check, then a one-line notice if an update is pending.
    pub async fn notify_pending_update(&self) {
        if self.config.background_update_check {
            match self.update_checker() {
                Ok(checker) => {
                    checker.background_check().await;
                }
                Err(e) => tracing::debug!("Skipping background update check: {}", e),
            }
        }
        if self.quiet {
            return;
        }
        if let Some(notice) = pending_notice(&self.paths.update_flag).await {
            eprintln!("{} {}", "⚠".yellow(), notice.yellow());
        }
    }
}

impl Cli {
    /// Install the tracing subscriber. Logs go to stderr.
    pub fn init_logging(&self) {
        let default = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    }

    pub async fn execute(self) -> Result<()> {
        let Self {
            command,
            quiet,
            config,
            ..
        } = self;

        match command {
            Some(Commands::Config(cmd)) => cmd.execute(config).await,
            Some(Commands::Update(cmd)) => cmd.execute(&AppContext::load(config, quiet).await?).await,
            Some(Commands::Install(cmd)) => cmd.execute(&AppContext::load(config, quiet).await?).await,
            Some(Commands::Ssh(cmd)) => {
                let ctx = AppContext::load(config, quiet).await?;
                cmd.execute(&ctx, &mut Prompter::stdio()).await.map(|_| ())
            }
            Some(Commands::Pr(cmd)) => {
                let ctx = AppContext::load(config, quiet).await?;
                cmd.execute(&ctx, &mut Prompter::stdio()).await.map(|_| ())
            }
            Some(Commands::Bump(cmd)) => {
                let ctx = AppContext::load(config, quiet).await?;
                cmd.execute(&ctx, &mut Prompter::stdio()).await.map(|_| ())
            }
            None => {
                let ctx = AppContext::load(config, quiet).await?;
                menu::run(&ctx, &mut Prompter::stdio()).await
            }
        }
    }
}

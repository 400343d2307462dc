//! `tutils config`: inspect or create the configuration file.
//!
//! ```bash
//! tutils config          # same as `config show`
//! tutils config path
//! tutils config init [--force]
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::ToolConfig;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Print the effective configuration and data file locations
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with the default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let config_path = match config_path {
            Some(p) => p,
            None => ToolConfig::default_path()?,
        };

        match self.command {
            Some(ConfigSubcommands::Show) | None => Self::show(&config_path).await,
            Some(ConfigSubcommands::Path) => {
                println!("{}", config_path.display());
                Ok(())
            }
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(&config_path, force).await,
        }
    }

    async fn show(config_path: &std::path::Path) -> Result<()> {
        let config = ToolConfig::load_with_optional(Some(config_path.to_path_buf())).await?;
        let paths = config.paths()?;

        println!("{}", "Configuration".bold());
        if config_path.exists() {
            println!("Location: {}\n", config_path.display());
        } else {
            println!("Location: {} {}\n", config_path.display(), "(not created, using defaults)".dimmed());
        }
        println!("{}", toml::to_string_pretty(&config)?);

        println!("{}", "Data files".bold());
        println!("  servers:      {}", paths.servers.display());
        println!("  repositories: {}", paths.repos.display());
        println!("  update cache: {}", paths.update_cache.display());
        println!("  update flag:  {}", paths.update_flag.display());
        Ok(())
    }

    async fn init(config_path: &std::path::Path, force: bool) -> Result<()> {
        if config_path.exists() && !force {
            println!("{} Config already exists at: {}", "✗".red(), config_path.display());
            println!("  Use --force to overwrite");
            return Ok(());
        }

        ToolConfig::default().save_to(config_path).await?;
        println!("{} Created config at: {}", "✓".green(), config_path.display());
        Ok(())
    }
}

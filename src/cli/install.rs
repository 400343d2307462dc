//! `tutils install`: download the latest release and put it on PATH.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::AppContext;
use crate::installer::{self, InstallOptions};
use crate::utils::platform::resolve_path;

#[derive(Args, Debug, Default)]
pub struct InstallCommand {
    /// Install directory (default: `<data dir>/bin`)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Don't touch shell profiles
    #[arg(long)]
    no_profile: bool,
}

impl InstallCommand {
    pub async fn execute(self, ctx: &AppContext) -> Result<()> {
        let dir = match self.dir {
            Some(dir) => resolve_path(&dir.to_string_lossy())?,
            None => ctx.paths.root.join("bin"),
        };

        let options = InstallOptions {
            dir,
            update_profiles: !self.no_profile,
            quiet: ctx.quiet,
        };
        let report = installer::install(&ctx.release_source()?, &options).await?;

        println!(
            "{} {} ({}) into {}",
            "Installed".green().bold(),
            report.tag,
            report.asset,
            options.dir.display()
        );
        if !report.checksum_verified {
            println!("{}", "No checksum was published for this release; the download was not verified.".yellow());
        }
        for profile in &report.profiles_updated {
            println!("Added {} to PATH in {}", options.dir.display(), profile.display());
        }
        if !report.profiles_updated.is_empty() {
            println!("Open a new terminal (or source your profile) to use {}.", "tutils".bold());
        }
        Ok(())
    }
}

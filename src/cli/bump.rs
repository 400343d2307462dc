//! `tutils bump`: version bump for the project in the current directory.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncBufRead;

use super::prompt::Prompter;
use super::{AppContext, Flow};
use crate::bump::{self, BumpKind, BumpOptions, ProjectKind};

#[derive(Args, Debug, Default)]
pub struct BumpCommand {
    /// Which component to increment; asked interactively when omitted
    #[arg(value_enum)]
    kind: Option<BumpKind>,

    /// Only rewrite the manifest: no commit, no tag
    #[arg(long)]
    no_git: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long)]
    dir: Option<PathBuf>,
}

impl BumpCommand {
    pub async fn execute<R, W>(self, ctx: &AppContext, p: &mut Prompter<R, W>) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        ctx.notify_pending_update().await;

        let dir = match self.dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let kinds = bump::require_projects(&dir)?;
        let project = match kinds.as_slice() {
            [only] => *only,
            _ => {
                let labels: Vec<String> = kinds.iter().map(ToString::to_string).collect();
                match p.select("Both package.json and pyproject.toml found. Which one?", &labels).await? {
                    Some(i) => kinds[i],
                    None => return Ok(Flow::Back),
                }
            }
        };

        let current = bump::current_version(&dir, project)?;
        p.say(format!("Current version: {}", current.cyan()))?;

        let kind = match self.kind {
            Some(kind) => kind,
            None => {
                let labels: Vec<&str> = BumpKind::ALL.iter().map(|k| k.label()).collect();
                match p.select("Select version bump type:", &labels).await? {
                    Some(i) => BumpKind::ALL[i],
                    None => return Ok(Flow::Back),
                }
            }
        };

        let next = bump::bump_version(&current, kind)?;
        if !self.yes && !p.confirm(&format!("Bump {current} → {next}?"), true).await? {
            p.say("Cancelled.")?;
            return Ok(Flow::Back);
        }

        let options = BumpOptions {
            kind,
            git: !self.no_git,
        };
        let outcome = match project {
            ProjectKind::Python => bump::bump_python(&dir, options).await?,
            ProjectKind::Node => bump::bump_node(&dir, options).await?,
        };

        p.say(
            format!("Version updated: {} → {}", outcome.previous, outcome.current)
                .green()
                .bold(),
        )?;
        if options.git && project == ProjectKind::Python {
            p.say(format!("Created commit and tag v{}", outcome.current))?;
        }
        Ok(Flow::Done)
    }
}

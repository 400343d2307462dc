//! `tutils update`: interactive release check.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::io::Write;
use tokio::io::AsyncBufRead;
use tracing::debug;

use super::AppContext;
use super::prompt::Prompter;
use crate::core::ToolError;

#[derive(Args, Debug, Default)]
pub struct UpdateCommand {
    /// Ignore the cached result and ask GitHub again
    #[arg(long)]
    force: bool,
}

impl UpdateCommand {
    pub async fn execute(self, ctx: &AppContext) -> Result<()> {
        interactive_check(ctx, &mut Prompter::stdio(), self.force).await
    }
}

/// Check for a newer release and print the outcome.
///
/// Network failures are reported as a message, not an error.
pub async fn interactive_check<R, W>(ctx: &AppContext, p: &mut Prompter<R, W>, force: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let source = ctx.release_source()?;
    let releases_page = source.releases_page();
    let checker = ctx.update_checker()?;

    let status = match checker.check(force).await {
        Ok(status) => status,
        Err(e) => {
            if matches!(e.downcast_ref::<ToolError>(), Some(ToolError::NetworkError { .. })) {
                debug!("Update check failed: {:#}", e);
                return p.say("Could not reach GitHub to check for updates.".red());
            }
            return Err(e);
        }
    };

    if status.available {
        p.say(status.message().yellow().bold())?;
        p.say(format!(
            "Download it from {} or run {}.",
            releases_page.cyan(),
            "tutils install".bold()
        ))
    } else if status.latest.is_some() {
        p.say(status.message().green())
    } else {
        p.say(status.message())
    }
}

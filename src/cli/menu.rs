//! The main menu shown when `tutils` runs without a subcommand.

use anyhow::Result;
use std::io::Write;
use tokio::io::AsyncBufRead;

use super::prompt::Prompter;
use super::{AppContext, Flow, bump, pr, ssh, update};

const CHOICES: [&str; 5] = [
    "Check for updates",
    "Connect to server via SSH",
    "Create and merge GitHub pull request",
    "Update project version",
    "Exit",
];

/// Show the menu until a helper finishes or the user exits.
pub async fn run<R, W>(ctx: &AppContext, p: &mut Prompter<R, W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        let Some(choice) = p.select("What do you want to do?", &CHOICES).await? else {
            return Ok(());
        };

        let flow = match choice {
            0 => {
                update::interactive_check(ctx, p, false).await?;
                Flow::Done
            }
            1 => ssh::SshCommand::default().execute(ctx, p).await?,
            2 => pr::PrCommand::default().execute(ctx, p).await?,
            3 => bump::BumpCommand::default().execute(ctx, p).await?,
            _ => Flow::Done,
        };

        if flow == Flow::Done {
            return Ok(());
        }
    }
}

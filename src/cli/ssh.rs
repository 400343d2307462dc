//! `tutils ssh`: saved servers and connections.
//!
//! Without a subcommand this shows the server menu: every saved server,
//! then "Add server", "Remove server", "Clear SSH known_hosts" and "Back".

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::io::Write;
use tokio::io::AsyncBufRead;
use tracing::debug;

use super::prompt::Prompter;
use super::{AppContext, Flow};
use crate::core::ToolError;
use crate::servers::connect::{ProbeOutcome, connect, probe};
use crate::servers::known_hosts::{self, Removal};
use crate::servers::{ServerEntry, ServerList, append_entry, ensure_template, remove_entry};
use crate::utils::platform::known_hosts_path;

#[derive(Args, Debug, Default)]
pub struct SshCommand {
    #[command(subcommand)]
    command: Option<SshSubcommand>,
}

#[derive(Subcommand, Debug)]
enum SshSubcommand {
    /// List saved servers
    List,

    /// Save a new server; prompts for anything not given
    Add {
        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Host or IP, optionally `user@host[:port]`
        #[arg(long)]
        host: Option<String>,

        /// Login user when not part of --host
        #[arg(long)]
        user: Option<String>,

        /// Password, stored in plain text
        #[arg(long)]
        password: Option<String>,
    },

    /// Remove the first server with this display name
    Remove {
        name: String,
    },

    /// Connect to a saved server by display name
    Connect {
        name: String,
    },

    /// Empty ~/.ssh/known_hosts
    ClearKnownHosts {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },
}

impl SshCommand {
    pub async fn execute<R, W>(self, ctx: &AppContext, p: &mut Prompter<R, W>) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        match self.command {
            Some(SshSubcommand::List) => {
                list(ctx, p)?;
                Ok(Flow::Done)
            }
            Some(SshSubcommand::Add {
                name,
                host,
                user,
                password,
            }) => {
                let entry = match (name, host) {
                    (Some(name), Some(host)) => {
                        let connection = ServerEntry::connection_string(user.as_deref().unwrap_or(""), &host);
                        ServerEntry::new(name.trim(), connection).with_password(password)
                    }
                    (name, host) => match prompt_entry(p, name, host, user).await? {
                        Some(entry) => entry,
                        None => return Ok(Flow::Done),
                    },
                };
                add(ctx, p, &entry)?;
                Ok(Flow::Done)
            }
            Some(SshSubcommand::Remove {
                name,
            }) => {
                match remove_entry(&ctx.paths.servers, &name)? {
                    Some(entry) => p.say(format!("Removed {entry}."))?,
                    None => {
                        return Err(ToolError::InvalidInput {
                            reason: format!("no saved server named '{name}'"),
                        }
                        .into());
                    }
                }
                Ok(Flow::Done)
            }
            Some(SshSubcommand::Connect {
                name,
            }) => {
                ctx.notify_pending_update().await;
                let list = ServerList::load(&ctx.paths.servers)?;
                let entry = list.find(&name).cloned().ok_or_else(|| ToolError::InvalidInput {
                    reason: format!("no saved server named '{name}'"),
                })?;
                connect_flow(p, &entry).await?;
                Ok(Flow::Done)
            }
            Some(SshSubcommand::ClearKnownHosts {
                yes,
            }) => {
                clear_known_hosts(p, yes).await?;
                Ok(Flow::Done)
            }
            None => {
                ctx.notify_pending_update().await;
                menu(ctx, p).await
            }
        }
    }
}

fn list<R, W>(ctx: &AppContext, p: &mut Prompter<R, W>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let list = ServerList::load(&ctx.paths.servers)?;
    if list.is_empty() {
        return p.say(format!(
            "No servers saved in {}. Add one with {}.",
            ctx.paths.servers.display(),
            "tutils ssh add".bold()
        ));
    }
    for entry in list.entries() {
        if entry.password.is_some() {
            p.say(format!("{entry} {}", "[password]".dimmed()))?;
        } else {
            p.say(entry)?;
        }
    }
    Ok(())
}

fn add<R, W>(ctx: &AppContext, p: &mut Prompter<R, W>, entry: &ServerEntry) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    append_entry(&ctx.paths.servers, entry)?;
    p.say(format!("Server {} added to {}.", entry.to_string().green(), ctx.paths.servers.display()))?;
    if entry.password.is_some() {
        p.say(
            "Note: passwords are stored in plain text; the file is now readable only by you."
                .yellow(),
        )?;
    }
    Ok(())
}

/// Ask for the fields of a new server. `None` if input ends early.
async fn prompt_entry<R, W>(
    p: &mut Prompter<R, W>,
    name: Option<String>,
    host: Option<String>,
    user: Option<String>,
) -> Result<Option<ServerEntry>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let name = match name {
        Some(n) => n,
        None => match p.required_text("Display name").await? {
            Some(n) => n,
            None => return Ok(None),
        },
    };
    let host = match host {
        Some(h) => h,
        None => match p.required_text("Host or IP").await? {
            Some(h) => h,
            None => return Ok(None),
        },
    };
    let user = match user {
        Some(u) => u,
        None if host.contains('@') => String::new(),
        None => match p.required_text("User").await? {
            Some(u) => u,
            None => return Ok(None),
        },
    };
    let Some(password) = p.text("Password (leave empty for key auth)", None).await? else {
        return Ok(None);
    };

    let entry = ServerEntry::new(name.trim(), ServerEntry::connection_string(&user, &host))
        .with_password(Some(password));
    Ok(Some(entry))
}

async fn menu<R, W>(ctx: &AppContext, p: &mut Prompter<R, W>) -> Result<Flow>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if ensure_template(&ctx.paths.servers)? {
        p.say(format!(
            "Created template servers file at {}. You can add servers via the menu or edit the file.",
            ctx.paths.servers.display()
        ))?;
    }

    let list = ServerList::load(&ctx.paths.servers)?;
    let servers: Vec<&ServerEntry> = list.entries().collect();

    let mut choices: Vec<String> = servers.iter().map(ToString::to_string).collect();
    let actions = ["Add server", "Remove server", "Clear SSH known_hosts", "Back"];
    choices.extend(actions.iter().map(|s| s.to_string()));

    let Some(choice) = p.select("Select a server to connect:", &choices).await? else {
        return Ok(Flow::Back);
    };

    if let Some(entry) = servers.get(choice) {
        connect_flow(p, entry).await?;
        return Ok(Flow::Done);
    }

    match choice - servers.len() {
        0 => {
            if let Some(entry) = prompt_entry(p, None, None, None).await? {
                add(ctx, p, &entry)?;
            }
            Ok(Flow::Done)
        }
        1 => {
            if servers.is_empty() {
                p.say("No servers to remove.")?;
                return Ok(Flow::Back);
            }
            let Some(index) = p.select("Select a server to remove:", &choices[..servers.len()]).await? else {
                return Ok(Flow::Back);
            };
            let name = &servers[index].display_name;
            if p.confirm(&format!("Remove {}?", servers[index]), false).await? {
                if let Some(entry) = remove_entry(&ctx.paths.servers, name)? {
                    p.say(format!("Removed {entry}."))?;
                }
            }
            Ok(Flow::Done)
        }
        2 => {
            clear_known_hosts(p, false).await?;
            Ok(Flow::Done)
        }
        _ => Ok(Flow::Back),
    }
}

async fn clear_known_hosts<R, W>(p: &mut Prompter<R, W>, yes: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let path = known_hosts_path()?;
    let confirmed = yes
        || p.confirm(
            &format!(
                "This will permanently clear your SSH known_hosts file ({}).\nAre you sure you want to proceed?",
                path.display()
            ),
            false,
        )
        .await?;
    if !confirmed {
        return p.say("Cancelled.");
    }

    if known_hosts::clear(&path)? {
        p.say(format!("Cleared known_hosts at {}.", path.display()))
    } else {
        p.say(format!("No known_hosts file found at {}.", path.display()))
    }
}

/// Probe, fix a stale host key if the user agrees, then hand over the terminal.
async fn connect_flow<R, W>(p: &mut Prompter<R, W>, entry: &ServerEntry) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    p.say(format!("Connecting to {}...", entry.connection.cyan()))?;

    match probe(&entry.connection).await? {
        ProbeOutcome::Reachable | ProbeOutcome::NeedsInteraction => {}
        ProbeOutcome::HostKeyMismatch {
            host,
        } => {
            p.say(format!("Detected host key mismatch for {}", host.yellow()))?;
            let question = format!(
                "Host key for {host} appears changed. Remove existing known_hosts entry for {host} and retry?"
            );
            if !p.confirm(&question, false).await? {
                return Ok(());
            }
            match known_hosts::remove_host_key(&known_hosts_path()?, &host).await? {
                Removal::SshKeygen => p.say(format!("Removed known_hosts entry for {host} using ssh-keygen."))?,
                Removal::Manual(n) => p.say(format!("Removed {n} known_hosts entries for {host}."))?,
            }
        }
        ProbeOutcome::Failed {
            stderr,
        } => {
            let message = if stderr.trim().is_empty() {
                "Failed to connect via ssh. Check that ssh is installed and the address is correct."
            } else {
                stderr.trim_end()
            };
            return p.say(message);
        }
    }

    let status = connect(entry).await?;
    debug!("ssh session for {} ended with {}", entry.display_name, status);
    Ok(())
}

//! Launching SSH sessions.
//!
//! A connection is two steps: a quick non-interactive probe that surfaces
//! host key problems, then the interactive session. Password entries go
//! through `sshpass` on Unix or `plink` on Windows when available.

use anyhow::Result;
use std::process::ExitStatus;
use tracing::{debug, warn};

use super::ServerEntry;
use super::known_hosts::{HostKeyStatus, classify_stderr, known_hosts_name, split_port};
use crate::utils::ToolCommand;
use crate::utils::platform::{command_exists, is_windows};

/// Environment variable `sshpass -e` reads the password from.
const SSHPASS_ENV: &str = "SSHPASS";

/// Which program carries the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    Ssh,
    Sshpass,
    Plink,
    /// A password is stored but no helper exists; `ssh` will prompt
    SshPrompt,
}

/// Pick the launcher for `entry`. `has_tool` answers "is this on PATH?".
pub fn choose_launcher(entry: &ServerEntry, windows: bool, has_tool: impl Fn(&str) -> bool) -> Launcher {
    if entry.password.is_none() {
        return Launcher::Ssh;
    }
    if !windows && has_tool("sshpass") {
        Launcher::Sshpass
    } else if windows && has_tool("plink") {
        Launcher::Plink
    } else {
        Launcher::SshPrompt
    }
}

/// `-p <port>` (or plink's `-P <port>`) when `port` is set.
fn port_args(flag: &str, port: Option<&str>) -> Vec<String> {
    port.map(|p| vec![flag.to_string(), p.to_string()]).unwrap_or_default()
}

/// The interactive command for `entry`. The password never appears in logs.
///
/// ssh does not read `host:port`, so the port goes in its own flag.
pub fn session_command(entry: &ServerEntry, launcher: Launcher) -> ToolCommand {
    let (dest, port) = split_port(&entry.connection);
    match (launcher, entry.password.as_deref()) {
        (Launcher::Sshpass, Some(pw)) => {
            // -e keeps the password out of the process list
            ToolCommand::new("sshpass")
                .args(["-e", "ssh"])
                .args(port_args("-p", port))
                .arg(dest)
                .env(SSHPASS_ENV, pw)
        }
        (Launcher::Plink, Some(pw)) => ToolCommand::new("plink")
            .arg(dest)
            .args(port_args("-P", port))
            .arg("-pw")
            .secret_arg(pw),
        _ => ToolCommand::new("ssh").args(port_args("-p", port)).arg(dest),
    }
}

/// `ssh` with batch mode and strict host checking, running `true` remotely.
pub fn probe_command(addr: &str) -> ToolCommand {
    let (dest, port) = split_port(addr);
    ToolCommand::new("ssh")
        .args([
            "-o",
            "BatchMode=yes",
            "-o",
            "ConnectTimeout=5",
            "-o",
            "StrictHostKeyChecking=yes",
        ])
        .args(port_args("-p", port))
        .args([dest, "true"])
        .with_context("probe")
}

/// Result of the pre-connect probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Key auth works end to end
    Reachable,
    /// The stored host key is stale; `host` is its `known_hosts` name
    HostKeyMismatch {
        host: String,
    },
    /// The server answered; the session needs a password or a first-time key prompt
    NeedsInteraction,
    /// Anything else; stderr is shown verbatim
    Failed {
        stderr: String,
    },
}

/// Interpret a finished probe.
pub fn interpret_probe(addr: &str, success: bool, stderr: &str) -> ProbeOutcome {
    if success {
        return ProbeOutcome::Reachable;
    }
    match classify_stderr(stderr) {
        HostKeyStatus::Mismatch => ProbeOutcome::HostKeyMismatch {
            host: known_hosts_name(addr),
        },
        HostKeyStatus::Unknown => ProbeOutcome::NeedsInteraction,
        HostKeyStatus::Fine if stderr.to_lowercase().contains("permission denied") => {
            ProbeOutcome::NeedsInteraction
        }
        HostKeyStatus::Fine => ProbeOutcome::Failed {
            stderr: stderr.to_string(),
        },
    }
}

pub async fn probe(addr: &str) -> Result<ProbeOutcome> {
    let out = probe_command(addr).probe().await?;
    let outcome = interpret_probe(addr, out.success, &out.stderr);
    debug!("Probe of {} -> {:?}", addr, outcome);
    Ok(outcome)
}

/// Open the interactive session and wait for it to end.
pub async fn connect(entry: &ServerEntry) -> Result<ExitStatus> {
    let launcher = choose_launcher(entry, is_windows(), command_exists);
    if launcher == Launcher::SshPrompt {
        warn!("Password stored for {} but neither sshpass nor plink was found", entry.display_name);
    }
    session_command(entry, launcher).run_interactive().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_pw() -> ServerEntry {
        ServerEntry::new("S", "u@h").with_password(Some("pw".to_string()))
    }

    #[test]
    fn test_choose_launcher_without_password() {
        let entry = ServerEntry::new("S", "u@h");
        assert_eq!(choose_launcher(&entry, false, |_| true), Launcher::Ssh);
        assert_eq!(choose_launcher(&entry, true, |_| true), Launcher::Ssh);
    }

    #[test]
    fn test_choose_launcher_with_password() {
        assert_eq!(choose_launcher(&with_pw(), false, |t| t == "sshpass"), Launcher::Sshpass);
        assert_eq!(choose_launcher(&with_pw(), true, |t| t == "plink"), Launcher::Plink);
        assert_eq!(choose_launcher(&with_pw(), false, |_| false), Launcher::SshPrompt);
        // sshpass is not used on Windows
        assert_eq!(choose_launcher(&with_pw(), true, |t| t == "sshpass"), Launcher::SshPrompt);
    }

    #[test]
    fn test_session_commands() {
        let plain = session_command(&ServerEntry::new("S", "u@h"), Launcher::Ssh);
        assert_eq!(plain.display_line(), "ssh u@h");

        let sshpass = session_command(&with_pw(), Launcher::Sshpass);
        assert_eq!(sshpass.display_line(), "sshpass -e ssh u@h");
        assert!(!sshpass.get_args().contains(&"pw".to_string()));

        let plink = session_command(&with_pw(), Launcher::Plink);
        assert_eq!(plink.display_line(), "plink u@h -pw ******");

        let prompt = session_command(&with_pw(), Launcher::SshPrompt);
        assert_eq!(prompt.display_line(), "ssh u@h");
    }

    #[test]
    fn test_session_commands_with_port() {
        let ported = ServerEntry::new("S", "ubuntu@10.0.0.7:2222");
        assert_eq!(session_command(&ported, Launcher::Ssh).display_line(), "ssh -p 2222 ubuntu@10.0.0.7");

        let ported = ported.with_password(Some("s3cret".to_string()));
        assert_eq!(
            session_command(&ported, Launcher::Sshpass).display_line(),
            "sshpass -e ssh -p 2222 ubuntu@10.0.0.7"
        );
        assert_eq!(
            session_command(&ported, Launcher::Plink).display_line(),
            "plink ubuntu@10.0.0.7 -P 2222 -pw ******"
        );
    }

    #[test]
    fn test_preflight_command_with_port() {
        assert_eq!(
            probe_command("ubuntu@10.0.0.7:2222").display_line(),
            "ssh -o BatchMode=yes -o ConnectTimeout=5 -o StrictHostKeyChecking=yes -p 2222 ubuntu@10.0.0.7 true"
        );
    }

    #[test]
    fn test_probe_command_args() {
        let cmd = probe_command("u@h");
        assert_eq!(
            cmd.display_line(),
            "ssh -o BatchMode=yes -o ConnectTimeout=5 -o StrictHostKeyChecking=yes u@h true"
        );
    }

    #[test]
    fn test_interpret_probe() {
        assert_eq!(interpret_probe("u@h", true, ""), ProbeOutcome::Reachable);
        assert_eq!(
            interpret_probe("u@h:22", false, "WARNING: REMOTE HOST IDENTIFICATION HAS CHANGED!"),
            ProbeOutcome::HostKeyMismatch {
                host: "h".to_string()
            }
        );
        assert_eq!(
            interpret_probe("u@h:2222", false, "Host key verification failed."),
            ProbeOutcome::HostKeyMismatch {
                host: "[h]:2222".to_string()
            }
        );
        assert_eq!(
            interpret_probe("u@h", false, "u@h: Permission denied (publickey,password)."),
            ProbeOutcome::NeedsInteraction
        );
        assert_eq!(
            interpret_probe("u@h", false, "Connection refused"),
            ProbeOutcome::Failed {
                stderr: "Connection refused".to_string()
            }
        );
    }
}

//! Host key handling: mismatch detection and `known_hosts` cleanup.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::utils::ToolCommand;
use crate::utils::fs::safe_write;

/// What the non-interactive probe learned about host keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyStatus {
    /// No host key complaint
    Fine,
    /// The host is not in `known_hosts` yet; `ssh` will ask interactively
    Unknown,
    /// The stored key differs from the one the server presented
    Mismatch,
}

/// Classify ssh stderr. Matching is case-insensitive.
#[must_use]
pub fn classify_stderr(stderr: &str) -> HostKeyStatus {
    let upper = stderr.to_uppercase();
    if upper.contains("REMOTE HOST IDENTIFICATION HAS CHANGED") {
        HostKeyStatus::Mismatch
    } else if upper.contains("HOST KEY VERIFICATION FAILED") {
        // StrictHostKeyChecking=yes also fails this way for hosts never seen before
        if upper.contains("HOST KEY IS KNOWN FOR") {
            HostKeyStatus::Unknown
        } else {
            HostKeyStatus::Mismatch
        }
    } else {
        HostKeyStatus::Fine
    }
}

/// Split `user@host[:port]` into the ssh destination and the port.
///
/// Only a single trailing `:digits` counts as a port, so bare IPv6
/// addresses pass through whole.
#[must_use]
pub fn split_port(addr: &str) -> (&str, Option<&str>) {
    let host_start = addr.find('@').map_or(0, |i| i + 1);
    let host = &addr[host_start..];
    if host.matches(':').count() != 1 {
        return (addr, None);
    }
    match host.rsplit_once(':') {
        Some((_, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            (&addr[..addr.len() - port.len() - 1], Some(port))
        }
        _ => (addr, None),
    }
}

/// Host part of `user@host[:port]`.
#[must_use]
pub fn extract_host(addr: &str) -> &str {
    let (dest, _) = split_port(addr);
    dest.split_once('@').map_or(dest, |(_, h)| h)
}

/// The name `known_hosts` files `addr` under: `host`, or `[host]:port` off port 22.
#[must_use]
pub fn known_hosts_name(addr: &str) -> String {
    match split_port(addr) {
        (_, Some(port)) if port != "22" => format!("[{}]:{port}", extract_host(addr)),
        _ => extract_host(addr).to_string(),
    }
}

/// Whether a `known_hosts` line names `host` in its host-pattern field.
///
/// Handles `host1,host2`, `[host]:port` and a leading `@marker`. A bare
/// `host` also matches its `[host]:port` entries; a bracketed one matches
/// only itself. Hashed entries never match; `ssh-keygen -R` takes care of
/// those.
fn line_matches_host(line: &str, host: &str) -> bool {
    let mut fields = line.split_whitespace();
    let Some(mut patterns) = fields.next() else {
        return false;
    };
    if patterns.starts_with('@') {
        match fields.next() {
            Some(p) => patterns = p,
            None => return false,
        }
    }

    patterns.split(',').any(|pattern| {
        let bare = match pattern.strip_prefix('[') {
            Some(rest) => rest.split_once(']').map_or(rest, |(h, _)| h),
            None => pattern,
        };
        pattern == host || bare == host
    })
}

/// Drop every line naming `host`. Returns the new content and how many lines went.
#[must_use]
pub fn strip_host_lines(content: &str, host: &str) -> (String, usize) {
    let mut kept = String::with_capacity(content.len());
    let mut removed = 0;
    for line in content.lines() {
        if line_matches_host(line, host) {
            removed += 1;
        } else {
            kept.push_str(line);
            kept.push('\n');
        }
    }
    (kept, removed)
}

/// Rewrite `path` without the lines naming `host`.
pub fn strip_host_from_file(path: &Path, host: &str) -> Result<usize> {
    let content = match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let (updated, removed) = strip_host_lines(&content, host);
    if removed > 0 {
        safe_write(path, &updated)?;
    }
    Ok(removed)
}

/// How the stale key was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    SshKeygen,
    Manual(usize),
}

/// Remove the stored key for `host`: `ssh-keygen -R` first, then a manual rewrite of `path`.
pub async fn remove_host_key(path: &Path, host: &str) -> Result<Removal> {
    let keygen = ToolCommand::new("ssh-keygen")
        .args(["-R", host, "-f"])
        .arg(path.display().to_string())
        .with_context("known_hosts");

    match keygen.probe().await {
        Ok(out) if out.success => {
            info!("Removed known_hosts entry for {} using ssh-keygen", host);
            return Ok(Removal::SshKeygen);
        }
        Ok(out) => debug!("ssh-keygen -R failed: {}", out.stderr.trim()),
        Err(e) => debug!("ssh-keygen unavailable: {}", e),
    }

    warn!("Falling back to manual known_hosts edit for {}", host);
    let removed = strip_host_from_file(path, host)?;
    Ok(Removal::Manual(removed))
}

/// Truncate the known hosts file. Returns `false` if there was none.
pub fn clear(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::write(path, b"").with_context(|| format!("Failed to clear {}", path.display()))?;
    info!("Cleared {}", path.display());
    Ok(true)
}

//! Platform helpers: home directory, tool lookup, well-known paths.

use anyhow::Result;
use std::path::PathBuf;

use crate::core::ToolError;

#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| ToolError::NoHomeDirectory.into())
}

/// Whether `cmd` resolves to an executable on `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Fail with [`ToolError::ToolNotFound`] unless `cmd` is on `PATH`.
pub fn require_command(cmd: &str) -> Result<PathBuf> {
    which::which(cmd).map_err(|_| {
        ToolError::ToolNotFound {
            tool: cmd.to_string(),
        }
        .into()
    })
}

/// `~/.ssh/known_hosts`
pub fn known_hosts_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(".ssh").join("known_hosts"))
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{path}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

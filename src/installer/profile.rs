//! Shell profile editing for the install directory.
//!
//! The entry added is two lines, a marker comment and the export:
//!
//! ```sh
//! # Added by terminal-utils installer
//! export PATH="/home/me/.tutils/bin:$PATH"
//! ```
//!
//! A profile that already has the marker, or an identical export line, is
//! left alone, so installing twice never duplicates anything.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::utils::fs::safe_write;

pub const MARKER: &str = "# Added by terminal-utils installer";

const RC_FILES: [&str; 3] = [".bashrc", ".zshrc", ".profile"];

#[must_use]
pub fn export_line(dir: &Path) -> String {
    format!("export PATH=\"{}:$PATH\"", dir.display())
}

/// Whether `content` already puts `dir` on PATH.
#[must_use]
pub fn has_entry(content: &str, dir: &Path) -> bool {
    let export = export_line(dir);
    content.lines().map(str::trim).any(|line| line == MARKER || line == export)
}

/// `content` with the entry appended, or `None` if it is already there.
#[must_use]
pub fn with_entry(content: &str, dir: &Path) -> Option<String> {
    if has_entry(content, dir) {
        return None;
    }

    let mut updated = String::with_capacity(content.len() + 128);
    updated.push_str(content);
    if !updated.is_empty() {
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push('\n');
    }
    updated.push_str(MARKER);
    updated.push('\n');
    updated.push_str(&export_line(dir));
    updated.push('\n');
    Some(updated)
}

/// Add the PATH entry to `profile`, creating the file if needed.
/// Returns whether the file changed.
pub fn ensure_path_entry(profile: &Path, dir: &Path) -> Result<bool> {
    let content = match std::fs::read_to_string(profile) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", profile.display())),
    };

    match with_entry(&content, dir) {
        Some(updated) => {
            safe_write(profile, &updated)?;
            info!("Added {} to PATH in {}", dir.display(), profile.display());
            Ok(true)
        }
        None => {
            debug!("{} already adds {} to PATH", profile.display(), dir.display());
            Ok(false)
        }
    }
}

/// Rc file read by the login shell named in `$SHELL`.
#[must_use]
pub fn shell_rc(shell: &str) -> &'static str {
    let name = Path::new(shell).file_name().and_then(|n| n.to_str()).unwrap_or(shell);
    match name {
        "zsh" => ".zshrc",
        "bash" => ".bashrc",
        _ => ".profile",
    }
}

/// Profiles to update: the existing rc files, plus the current shell's rc
/// even if it does not exist yet.
pub fn candidate_profiles(home: &Path, shell: Option<&str>, exists: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut profiles: Vec<PathBuf> =
        RC_FILES.iter().map(|name| home.join(name)).filter(|p| exists(p)).collect();

    if let Some(shell) = shell.filter(|s| !s.is_empty()) {
        let own = home.join(shell_rc(shell));
        if !profiles.contains(&own) {
            profiles.push(own);
        }
    }
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_with_entry_appends_once() {
        let dir = Path::new("/opt/tutils/bin");
        let first = with_entry("alias ll='ls -l'", dir).unwrap();
        assert_eq!(
            first,
            "alias ll='ls -l'\n\n# Added by terminal-utils installer\nexport PATH=\"/opt/tutils/bin:$PATH\"\n"
        );
        assert!(with_entry(&first, dir).is_none());
    }

    #[test]
    fn test_existing_export_line_counts() {
        let dir = Path::new("/opt/tutils/bin");
        let content = format!("  {}\n", export_line(dir));
        assert!(has_entry(&content, dir));
        assert!(!has_entry("export PATH=\"/other:$PATH\"\n", dir));
    }

    #[test]
    fn test_ensure_path_entry_twice() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join(".bashrc");
        std::fs::write(&profile, "export EDITOR=vim\n").unwrap();
        let dir = temp.path().join("bin");

        assert!(ensure_path_entry(&profile, &dir).unwrap());
        assert!(!ensure_path_entry(&profile, &dir).unwrap());

        let content = std::fs::read_to_string(&profile).unwrap();
        assert_eq!(content.matches(MARKER).count(), 1);
        assert_eq!(content.matches(&export_line(&dir)).count(), 1);
        assert!(content.starts_with("export EDITOR=vim\n"));
    }

    #[test]
    fn test_ensure_path_entry_creates_file() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join(".zshrc");
        assert!(ensure_path_entry(&profile, Path::new("/x")).unwrap());
        assert!(std::fs::read_to_string(&profile).unwrap().starts_with(MARKER));
    }

    #[test]
    fn test_shell_rc() {
        assert_eq!(shell_rc("/bin/zsh"), ".zshrc");
        assert_eq!(shell_rc("/usr/bin/bash"), ".bashrc");
        assert_eq!(shell_rc("/usr/bin/fish"), ".profile");
    }

    #[test]
    fn test_candidate_profiles() {
        let home = Path::new("/home/me");
        let existing = |p: &Path| p.ends_with(".bashrc") || p.ends_with(".profile");

        let profiles = candidate_profiles(home, Some("/bin/zsh"), existing);
        assert_eq!(
            profiles,
            vec![home.join(".bashrc"), home.join(".profile"), home.join(".zshrc")]
        );

        let profiles = candidate_profiles(home, Some("/bin/bash"), existing);
        assert_eq!(profiles, vec![home.join(".bashrc"), home.join(".profile")]);

        assert!(candidate_profiles(home, None, |_| false).is_empty());
    }
}

//! SSH server list
//!
//! Servers are kept in a plain text file, one per line:
//!
//! ```text
//! # comments start with '#'
//! Production|deploy@prod.example.com
//! Staging|ubuntu@10.0.0.7:2222|s3cret
//! ```
//!
//! The fields are `display name|user@host[|password]`. A line without a `|`
//! is malformed: it is skipped with a warning and loading carries on. The
//! password field is split off with `splitn`, so a password may itself
//! contain `|`.
//!
//! [`ServerList`] keeps comments, blank lines and malformed lines so a
//! rewrite after [`ServerList::remove`] does not lose anything the user typed.
//! New entries are appended to the end of the file and never touch existing
//! lines.
//!
//! Passwords are stored in plain text. Every write that carries a password
//! restricts the file to its owner and the CLI warns about it.

pub mod connect;
pub mod known_hosts;

use anyhow::{Context, Result};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

use crate::core::ToolError;
use crate::utils::fs::{safe_write, set_owner_only};

const TEMPLATE_HEADER: &str = "\
# Servers file for tutils ssh
# Format: Display Name|user@host[|password]
# Lines starting with '#' are ignored.
";

/// One connectable server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub display_name: String,
    /// `user@host`, optionally with `:port`
    pub connection: String,
    pub password: Option<String>,
}

impl ServerEntry {
    pub fn new(display_name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            connection: connection.into(),
            password: None,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    /// Build `user@host` from separate prompts; an empty user yields the bare host.
    #[must_use]
    pub fn connection_string(user: &str, host: &str) -> String {
        let user = user.trim();
        let host = host.trim();
        if user.is_empty() {
            host.to_string()
        } else {
            format!("{user}@{host}")
        }
    }

    /// Parse one non-comment line. `None` means the line is malformed.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.contains('|') {
            return None;
        }

        let mut parts = line.splitn(3, '|').map(str::trim);
        let display_name = parts.next().unwrap_or_default();
        let connection = parts.next().unwrap_or_default();
        let password = parts.next().filter(|p| !p.is_empty()).map(str::to_string);

        if connection.is_empty() {
            return None;
        }

        Some(Self {
            display_name: display_name.to_string(),
            connection: connection.to_string(),
            password,
        })
    }

    /// Serialized form, without a trailing newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        match &self.password {
            Some(pw) => format!("{}|{}|{}", self.display_name, self.connection, pw),
            None => format!("{}|{}", self.display_name, self.connection),
        }
    }

    /// Reject values that would corrupt the file format.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: &str| -> anyhow::Error {
            ToolError::InvalidInput {
                reason: format!("{field} {reason}"),
            }
            .into()
        };

        if self.display_name.contains('|') {
            return Err(invalid("display name", "must not contain '|'"));
        }
        if self.connection.trim().is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.connection.contains('|') {
            return Err(invalid("host", "must not contain '|'"));
        }
        let host = self.connection.split_once('@').map_or(self.connection.as_str(), |(_, h)| h);
        if host.matches(':').count() == 1 {
            let port = known_hosts::split_port(&self.connection).1.and_then(|p| p.parse::<u16>().ok());
            if !port.is_some_and(|p| p > 0) {
                return Err(invalid("port", "must be a number between 1 and 65535"));
            }
        }
        if self.display_name.trim_start().starts_with('#') {
            return Err(invalid("display name", "must not start with '#'"));
        }
        let fields = [&self.display_name, &self.connection];
        if fields.iter().any(|f| f.contains('\n') || f.contains('\r'))
            || self.password.as_deref().is_some_and(|p| p.contains('\n') || p.contains('\r'))
        {
            return Err(invalid("entry", "must not contain line breaks"));
        }
        Ok(())
    }
}

impl fmt::Display for ServerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.connection)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry(ServerEntry),
    Comment(String),
    Blank,
    /// Kept verbatim so rewrites don't drop it
    Malformed(String),
}

/// Ordered contents of a servers file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerList {
    lines: Vec<Line>,
}

impl ServerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse file contents. Malformed lines are logged and excluded from
    /// [`entries`](Self::entries).
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                lines.push(Line::Blank);
            } else if trimmed.starts_with('#') {
                lines.push(Line::Comment(trimmed.to_string()));
            } else if let Some(entry) = ServerEntry::parse_line(trimmed) {
                lines.push(Line::Entry(entry));
            } else {
                warn!("Skipping malformed server line {}: {:?}", idx + 1, trimmed);
                lines.push(Line::Malformed(trimmed.to_string()));
            }
        }

        Self {
            lines,
        }
    }

    /// Load from `path`. A missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No servers file at {}", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ServerEntry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    pub fn get(&self, index: usize) -> Option<&ServerEntry> {
        self.entries().nth(index)
    }

    pub fn find(&self, display_name: &str) -> Option<&ServerEntry> {
        self.entries().find(|e| e.display_name == display_name)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lines that were skipped as malformed.
    pub fn malformed_count(&self) -> usize {
        self.lines.iter().filter(|l| matches!(l, Line::Malformed(_))).count()
    }

    fn has_passwords(&self) -> bool {
        self.entries().any(|e| e.password.is_some())
    }

    /// Remove the first entry named `display_name`.
    pub fn remove(&mut self, display_name: &str) -> Option<ServerEntry> {
        let pos = self
            .lines
            .iter()
            .position(|l| matches!(l, Line::Entry(e) if e.display_name == display_name))?;
        match self.lines.remove(pos) {
            Line::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    /// Render back to file form, one line per entry with a trailing newline.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry(entry) => out.push_str(&entry.to_line()),
                Line::Comment(text) | Line::Malformed(text) => out.push_str(text),
                Line::Blank => {}
            }
            out.push('\n');
        }
        out
    }

    /// Rewrite the whole file.
    pub fn save(&self, path: &Path) -> Result<()> {
        safe_write(path, &self.serialize())?;
        if self.has_passwords() {
            set_owner_only(path)?;
        }
        debug!("Saved {} servers to {}", self.len(), path.display());
        Ok(())
    }
}

/// Append `entry` to the file at `path`, creating it if needed.
///
/// Existing bytes are left untouched; a missing final newline is added first.
pub fn append_entry(path: &Path, entry: &ServerEntry) -> Result<()> {
    entry.validate()?;

    let needs_newline = match std::fs::read(path) {
        Ok(bytes) => !bytes.is_empty() && !bytes.ends_with(b"\n"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    if let Some(parent) = path.parent() {
        crate::utils::fs::ensure_dir(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    if needs_newline {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{}", entry.to_line())
        .with_context(|| format!("Failed to append to {}", path.display()))?;

    if entry.password.is_some() {
        set_owner_only(path)?;
    }

    debug!("Appended server '{}' to {}", entry.display_name, path.display());
    Ok(())
}

/// Remove the first entry named `display_name` from the file and persist.
pub fn remove_entry(path: &Path, display_name: &str) -> Result<Option<ServerEntry>> {
    let mut list = ServerList::load(path)?;
    let removed = list.remove(display_name);
    if removed.is_some() {
        list.save(path)?;
    }
    Ok(removed)
}

/// Write the commented header when no servers file exists yet.
///
/// Returns `true` if the file was created.
pub fn ensure_template(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    safe_write(path, TEMPLATE_HEADER)?;
    Ok(true)
}

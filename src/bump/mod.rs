//! Project version bumping.
//!
//! Two project types are recognised by their manifest:
//!
//! | Kind | Manifest | How the bump is applied |
//! |------|----------|-------------------------|
//! | Python | `pyproject.toml` | rewritten in place, then `git commit` + `git tag vX.Y.Z` |
//! | Node | `package.json` | delegated to `npm version <kind>` |
//!
//! The arithmetic lives in [`bump_version`]; the manifest formats live in
//! [`pyproject`] and [`package_json`].

pub mod package_json;
pub mod pyproject;

use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::core::ToolError;
use crate::git;
use crate::utils::ToolCommand;
use crate::utils::platform::require_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Python,
    Node,
}

impl ProjectKind {
    pub const fn manifest(self) -> &'static str {
        match self {
            Self::Python => pyproject::FILE_NAME,
            Self::Node => package_json::FILE_NAME,
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "Python ({})", self.manifest()),
            Self::Node => write!(f, "Node.js ({})", self.manifest()),
        }
    }
}

/// Which component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

impl BumpKind {
    pub const ALL: [Self; 3] = [Self::Patch, Self::Minor, Self::Major];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }

    /// Menu label, e.g. `Minor (0.X.0)`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Patch => "Patch (0.0.X)",
            Self::Minor => "Minor (0.X.0)",
            Self::Major => "Major (X.0.0)",
        }
    }
}

impl fmt::Display for BumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            other => Err(ToolError::InvalidInput {
                reason: format!("unknown bump type '{other}' (expected major, minor or patch)"),
            }),
        }
    }
}

/// Manifests present in `dir`, Node first.
pub fn detect_projects(dir: &Path) -> Vec<ProjectKind> {
    let mut kinds = Vec::new();
    if dir.join(package_json::FILE_NAME).is_file() {
        kinds.push(ProjectKind::Node);
    }
    if dir.join(pyproject::FILE_NAME).is_file() {
        kinds.push(ProjectKind::Python);
    }
    kinds
}

/// Like [`detect_projects`] but fails loudly when nothing is recognised.
pub fn require_projects(dir: &Path) -> Result<Vec<ProjectKind>> {
    let kinds = detect_projects(dir);
    if kinds.is_empty() {
        return Err(ToolError::ManifestNotFound {
            dir: dir.display().to_string(),
        }
        .into());
    }
    Ok(kinds)
}

#[allow(clippy::expect_used)]
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*v?(\d+)\.(\d+)\.(\d+)").expect("version pattern is valid"));

/// Apply a semantic increment to the leading `MAJOR.MINOR.PATCH` of `version`.
///
/// Any pre-release or build suffix is dropped.
pub fn bump_version(version: &str, kind: BumpKind) -> Result<String, ToolError> {
    let invalid = || ToolError::InvalidVersion {
        version: version.to_string(),
    };

    let caps = VERSION_RE.captures(version).ok_or_else(invalid)?;
    let part = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());
    let (mut major, mut minor, mut patch) = (part(1)?, part(2)?, part(3)?);

    let next = |n: u64| n.checked_add(1).ok_or_else(invalid);
    match kind {
        BumpKind::Patch => patch = next(patch)?,
        BumpKind::Minor => {
            minor = next(minor)?;
            patch = 0;
        }
        BumpKind::Major => {
            major = next(major)?;
            minor = 0;
            patch = 0;
        }
    }

    Ok(format!("{major}.{minor}.{patch}"))
}

/// Current version declared by the manifest of `kind` in `dir`.
pub fn current_version(dir: &Path, kind: ProjectKind) -> Result<String> {
    let path = dir.join(kind.manifest());
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let version = match kind {
        ProjectKind::Python => pyproject::read_version(&content)?,
        ProjectKind::Node => package_json::read_version(&content)?,
    };
    version.ok_or_else(|| {
        ToolError::VersionFieldMissing {
            file: kind.manifest().to_string(),
        }
        .into()
    })
}

/// Options shared by both project kinds.
#[derive(Debug, Clone, Copy)]
pub struct BumpOptions {
    pub kind: BumpKind,
    /// Create the release commit and tag
    pub git: bool,
}

/// Old and new version after a successful bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    pub previous: String,
    pub current: String,
}

/// Bump `pyproject.toml` in `dir`, then commit and tag unless disabled.
pub async fn bump_python(dir: &Path, options: BumpOptions) -> Result<BumpOutcome> {
    if options.git {
        require_command("git")?;
        if !git::is_clean(Some(dir)).await? {
            return Err(ToolError::DirtyWorkingTree.into());
        }
    }

    let path = dir.join(pyproject::FILE_NAME);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let previous = pyproject::read_version(&content)?.ok_or_else(|| ToolError::VersionFieldMissing {
        file: pyproject::FILE_NAME.to_string(),
    })?;
    let current = bump_version(&previous, options.kind)?;

    let updated = pyproject::set_version(&content, &current)?;
    crate::utils::fs::safe_write(&path, &updated)?;
    info!("Updated {} from {} to {}", path.display(), previous, current);

    if options.git {
        let tag = format!("v{current}");
        git::add(Some(dir), pyproject::FILE_NAME).await?;
        git::commit(Some(dir), &tag).await?;
        git::tag(Some(dir), &tag).await?;
        info!("Created commit and tag {}", tag);
    }

    Ok(BumpOutcome {
        previous,
        current,
    })
}

/// The `npm version` invocation for `options`.
pub fn npm_command(npm: &Path, dir: &Path, options: BumpOptions) -> ToolCommand {
    let cmd = ToolCommand::new(npm.display().to_string())
        .args(["version", options.kind.as_str()])
        .current_dir(dir);
    if options.git { cmd } else { cmd.arg("--no-git-tag-version") }
}

/// Let npm bump `package.json` (and commit/tag when git is enabled).
pub async fn bump_node(dir: &Path, options: BumpOptions) -> Result<BumpOutcome> {
    let npm = require_command("npm")?;
    let previous = current_version(dir, ProjectKind::Node)?;

    npm_command(&npm, dir, options).run_interactive_checked().await?;

    let current = current_version(dir, ProjectKind::Node)?;
    Ok(BumpOutcome {
        previous,
        current,
    })
}

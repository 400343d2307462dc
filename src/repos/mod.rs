//! Repository registry for the pull request helper.
//!
//! `repos.json` is a JSON array of repository descriptors:
//!
//! ```json
//! [
//!   {
//!     "name": "website",
//!     "repo": "acme/website",
//!     "pairs": [
//!       { "head": "develop", "base": "main" },
//!       { "head": "main", "base": "release" }
//!     ]
//!   }
//! ]
//! ```
//!
//! The file is loaded wholesale, changed in memory and rewritten wholesale.
//! Keys this tool does not know about are carried through untouched.

pub mod github;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::core::ToolError;
use crate::utils::fs::safe_write;

/// Base branches tried when inferring pairs for a new repository.
pub const COMMON_BASES: [&str; 6] = ["main", "master", "develop", "beta", "staging", "release"];

/// Pairs used when the remote lists no usable branches.
pub const FALLBACK_BRANCHES: [&str; 3] = ["develop", "main", "beta"];

/// Inference stops adding heads once this many pairs exist.
pub const MAX_INFERRED_PAIRS: usize = 30;

/// A `head → base` merge direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchPair {
    pub head: String,
    pub base: String,
}

impl BranchPair {
    pub fn new(head: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            base: base.into(),
        }
    }
}

impl fmt::Display for BranchPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.head, self.base)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// `owner/name` slug on GitHub
    pub repo: String,

    #[serde(default)]
    pub pairs: Vec<BranchPair>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RepoConfig {
    pub fn new(name: impl Into<String>, repo: impl Into<String>, pairs: Vec<BranchPair>) -> Self {
        Self {
            name: name.into(),
            repo: repo.into(),
            pairs,
            extra: serde_json::Map::new(),
        }
    }

    /// Entry for a freshly detected repository, named after the slug's last segment.
    pub fn from_slug(slug: &str, pairs: Vec<BranchPair>) -> Self {
        let name = slug.rsplit('/').next().unwrap_or(slug);
        Self::new(name, slug, pairs)
    }

    /// `name`, or the slug when no name was given.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.repo } else { &self.name }
    }

    /// Menu label: `name [owner/repo]`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.display_name(), self.repo)
    }

    /// Whether this entry describes the repository behind `remote_url`.
    pub fn matches_remote(&self, remote_url: &str) -> bool {
        match parse_remote_slug(remote_url) {
            Some(slug) => slug.eq_ignore_ascii_case(&self.repo),
            None => !self.repo.is_empty() && remote_url.contains(&self.repo),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoRegistry {
    pub repos: Vec<RepoConfig>,
}

impl RepoRegistry {
    /// Load `repos.json`. A missing file is an empty registry; a corrupt one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No repository registry at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let repos: Vec<RepoConfig> =
            serde_json::from_str(&content).map_err(|e| ToolError::ParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            repos,
        })
    }

    /// Rewrite the whole file, pretty-printed with two-space indent.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content =
            serde_json::to_string_pretty(&self.repos).context("Failed to serialize repositories")?;
        content.push('\n');
        safe_write(path, &content)?;
        debug!("Saved {} repositories to {}", self.repos.len(), path.display());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.repos.iter().any(|r| r.repo.eq_ignore_ascii_case(slug))
    }

    /// Entry whose slug (case-insensitive) or name is `wanted`.
    pub fn find(&self, wanted: &str) -> Option<&RepoConfig> {
        self.repos.iter().find(|r| r.repo.eq_ignore_ascii_case(wanted) || r.name == wanted)
    }

    /// Entries matching `remote_url`, in file order.
    pub fn detect(&self, remote_url: &str) -> Vec<&RepoConfig> {
        self.repos.iter().filter(|r| r.matches_remote(remote_url)).collect()
    }

    pub fn push(&mut self, repo: RepoConfig) {
        self.repos.push(repo);
    }
}

/// `owner/repo` from an SSH or HTTPS remote URL.
///
/// Accepts `git@host:owner/repo(.git)`, `ssh://git@host/owner/repo(.git)` and
/// `https://host/owner/repo(.git)`.
#[must_use]
pub fn parse_remote_slug(url: &str) -> Option<String> {
    let url = url.trim();
    let path = if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':')?.1
    } else if let Some((_, rest)) = url.split_once("://") {
        rest.split_once('/')?.1
    } else {
        return None;
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut segments = path.split('/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let name = segments.next().filter(|s| !s.is_empty())?;
    if segments.next().is_some() {
        // GitLab subgroups: keep the full path
        return Some(path.to_string());
    }
    Some(format!("{owner}/{name}"))
}

/// Build merge pairs from the branches a remote advertises.
///
/// Each head is paired with every common base branch present on the remote.
/// No new heads are started once [`MAX_INFERRED_PAIRS`] is reached. With no
/// usable pairs, all ordered pairs of [`FALLBACK_BRANCHES`] are returned.
#[must_use]
pub fn infer_pairs(branches: &[String]) -> Vec<BranchPair> {
    let mut unique: Vec<&str> = Vec::new();
    for branch in branches {
        if !unique.contains(&branch.as_str()) {
            unique.push(branch);
        }
    }

    let mut pairs = Vec::new();
    for head in &unique {
        for base in COMMON_BASES {
            if unique.contains(&base) && *head != base {
                pairs.push(BranchPair::new(*head, base));
            }
        }
        if pairs.len() >= MAX_INFERRED_PAIRS {
            break;
        }
    }

    if pairs.is_empty() {
        for head in FALLBACK_BRANCHES {
            for base in FALLBACK_BRANCHES {
                if head != base {
                    pairs.push(BranchPair::new(head, base));
                }
            }
        }
    }

    pairs
}

//! Update checks against the project's GitHub releases.
//!
//! Two small JSON files in the data directory carry state between runs:
//!
//! - `.update_cache.json` remembers when the releases API was last asked and
//!   what it answered, a failed request included. While it is younger than
//!   the TTL (five minutes by default) no request is made.
//! - `.update_available.json` exists only while a newer release is known.
//!   Every helper looks for it on startup and prints a one-line notice.
//!
//! [`UpdateChecker::check`] is the interactive variant and reports failures;
//! [`UpdateChecker::background_check`] never fails and never prints.

pub mod release;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::config::DataPaths;
use crate::core::ToolError;
use crate::utils::fs::{atomic_write, remove_if_exists};
pub use release::{GitHubReleases, Release, ReleaseAsset, ReleaseSource};

/// Version compared against the latest release.
pub const LOCAL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_TTL_SECS: u64 = 300;

/// Contents of `.update_cache.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCache {
    /// Unix time of the last query, successful or not
    #[serde(default)]
    pub last_checked: i64,
    /// `None` when the repository has no releases or the query failed
    #[serde(default)]
    pub latest: Option<String>,
    /// Why the last query failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateCache {
    /// Fresh when younger than `ttl_secs`. A timestamp in the future counts
    /// as stale.
    pub fn is_fresh(&self, now: i64, ttl_secs: u64) -> bool {
        let age = now - self.last_checked;
        age >= 0 && (age as u64) < ttl_secs
    }

    /// Read the cache; a missing or unreadable file is an empty cache.
    pub async fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path).await else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            debug!("Ignoring unreadable update cache {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec(self).context("Failed to serialize update cache")?;
        atomic_write(path, &content)
    }
}

/// Contents of `.update_available.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFlag {
    pub latest: String,
    pub local: String,
    /// Unix time the flag was written, with sub-second precision
    pub timestamp: f64,
}

impl UpdateFlag {
    pub fn new(latest: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            latest: latest.into(),
            local: local.into(),
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }

    pub async fn load(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec(self).context("Failed to serialize update flag")?;
        atomic_write(path, &content)
    }

    /// One-line reminder shown by every helper while the flag exists.
    pub fn notice(&self) -> String {
        format!(
            "Update available: {} (local: {}). Run `tutils update` for details.",
            self.latest, self.local
        )
    }
}

/// Integer components of a version, stopping at the first non-integer.
fn lenient_parts(version: &str) -> Vec<u64> {
    version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .map_while(|part| part.parse::<u64>().ok())
        .collect()
}

/// Order two release versions.
///
/// Strict semver ordering is used when both sides parse (after dropping a
/// leading `v`), so pre-releases sort below their release. Anything else is
/// compared component by component on the leading integers.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let strict = |v: &str| semver::Version::parse(v.trim().trim_start_matches(['v', 'V'])).ok();
    match (strict(a), strict(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => lenient_parts(a).cmp(&lenient_parts(b)),
    }
}

/// Outcome of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatus {
    pub available: bool,
    /// `None` when the repository has no releases
    pub latest: Option<String>,
    pub local: String,
}

impl UpdateStatus {
    pub fn new(latest: Option<String>, local: impl Into<String>) -> Self {
        let local = local.into();
        let available = latest
            .as_deref()
            .is_some_and(|l| compare_versions(l, &local) == Ordering::Greater);
        Self {
            available,
            latest,
            local,
        }
    }

    /// Human-readable summary for the interactive check.
    pub fn message(&self) -> String {
        let Some(latest) = &self.latest else {
            return "No releases found on GitHub.".to_string();
        };
        match compare_versions(latest, &self.local) {
            Ordering::Greater => format!("Update available: {latest} (local: {})", self.local),
            Ordering::Equal => format!("You are up to date (version {}).", self.local),
            Ordering::Less => format!(
                "Local version ({}) is newer than latest release ({latest}).",
                self.local
            ),
        }
    }
}

/// Cached release lookups plus flag-file maintenance.
#[derive(Debug)]
pub struct UpdateChecker<S> {
    source: S,
    cache_path: PathBuf,
    flag_path: PathBuf,
    ttl_secs: u64,
    local_version: String,
}

impl<S: ReleaseSource> UpdateChecker<S> {
    pub fn new(source: S, paths: &DataPaths) -> Self {
        Self {
            source,
            cache_path: paths.update_cache.clone(),
            flag_path: paths.update_flag.clone(),
            ttl_secs: DEFAULT_TTL_SECS,
            local_version: LOCAL_VERSION.to_string(),
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_local_version(mut self, version: impl Into<String>) -> Self {
        self.local_version = version.into();
        self
    }

    pub fn flag_path(&self) -> &Path {
        &self.flag_path
    }

    /// Latest release tag, from the cache when fresh unless `force` is set.
    ///
    /// A failed query is cached as well, so an offline machine asks at most
    /// once per TTL; until then the cached failure is returned as a
    /// [`ToolError::NetworkError`].
    pub async fn latest(&self, force: bool) -> Result<Option<String>> {
        let now = Utc::now().timestamp();
        let cache = UpdateCache::load(&self.cache_path).await;
        if !force && cache.is_fresh(now, self.ttl_secs) {
            debug!("Using cached release {:?} checked at {}", cache.latest, cache.last_checked);
            return match cache.error {
                Some(reason) => Err(ToolError::NetworkError {
                    operation: "fetch latest release".to_string(),
                    reason: format!("{reason} (cached)"),
                }
                .into()),
                None => Ok(cache.latest),
            };
        }

        let fetched = self.source.latest_release().await;
        let cache = match &fetched {
            Ok(release) => UpdateCache {
                last_checked: now,
                latest: release.as_ref().and_then(|r| r.tag_name.clone()),
                error: None,
            },
            Err(e) => UpdateCache {
                last_checked: now,
                latest: None,
                error: Some(format!("{e:#}")),
            },
        };
        if let Err(e) = cache.save(&self.cache_path) {
            debug!("Could not write update cache: {}", e);
        }

        fetched?;
        Ok(cache.latest)
    }

    /// Check for a newer release and keep the flag file in sync.
    pub async fn check(&self, force: bool) -> Result<UpdateStatus> {
        let latest = self.latest(force).await?;
        let status = UpdateStatus::new(latest, self.local_version.clone());
        self.sync_flag(&status)?;
        Ok(status)
    }

    /// Like [`check`](Self::check) but silent: every failure is logged at debug.
    pub async fn background_check(&self) -> Option<UpdateStatus> {
        match self.check(false).await {
            Ok(status) => Some(status),
            Err(e) => {
                debug!("Background update check failed: {:#}", e);
                None
            }
        }
    }

    fn sync_flag(&self, status: &UpdateStatus) -> Result<()> {
        match (&status.latest, status.available) {
            (Some(latest), true) => UpdateFlag::new(latest, &status.local).save(&self.flag_path),
            _ => remove_if_exists(&self.flag_path).map(|_| ()),
        }
    }
}

/// Notice for a pending update, if the flag file says there is one.
pub async fn pending_notice(flag_path: &Path) -> Option<String> {
    UpdateFlag::load(flag_path).await.map(|flag| flag.notice())
}

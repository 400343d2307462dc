//! GitHub releases API access.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::core::ToolError;

const API_BASE: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// The subset of the `releases/latest` payload tutils reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// First asset whose name ends with `suffix`.
    pub fn asset_with_suffix(&self, suffix: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name.ends_with(suffix))
    }

    pub fn asset_named(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Where release information comes from.
pub trait ReleaseSource {
    /// The latest published release, or `None` when the repository has none.
    fn latest_release(&self) -> impl Future<Output = Result<Option<Release>>> + Send;
}

/// `GET /repos/{owner}/{repo}/releases/latest` over HTTPS.
#[derive(Debug, Clone)]
pub struct GitHubReleases {
    owner: String,
    repo: String,
    client: reqwest::Client,
}

impl GitHubReleases {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let client = http_client(REQUEST_TIMEOUT)?;
        Ok(Self {
            owner: owner.into(),
            repo: repo.into(),
            client,
        })
    }

    pub fn latest_url(&self) -> String {
        format!("{API_BASE}/repos/{}/{}/releases/latest", self.owner, self.repo)
    }

    pub fn releases_page(&self) -> String {
        format!("https://github.com/{}/{}/releases", self.owner, self.repo)
    }
}

/// HTTP client with the tutils User-Agent; GitHub rejects requests without one.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(format!("terminal-utils/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

impl ReleaseSource for GitHubReleases {
    async fn latest_release(&self) -> Result<Option<Release>> {
        let url = self.latest_url();
        debug!("Fetching {}", url);

        let network = |reason: String| ToolError::NetworkError {
            operation: "fetch latest release".to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("No releases published for {}/{}", self.owner, self.repo);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(network(format!("GitHub API returned HTTP {status}")).into());
        }

        let release: Release = response.json().await.map_err(|e| network(e.to_string()))?;
        debug!("Latest release tag: {:?}", release.tag_name);
        Ok(Some(release))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_payload() {
        let json = r#"{
            "tag_name": "v1.4.0",
            "name": "1.4.0",
            "assets": [
                {"name": "tutils-linux.zip", "browser_download_url": "https://example.com/a.zip", "size": 10},
                {"name": "tutils-linux.zip.sha256", "browser_download_url": "https://example.com/a.sha256"}
            ]
        }"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name.as_deref(), Some("v1.4.0"));
        assert_eq!(release.asset_with_suffix(".zip").unwrap().name, "tutils-linux.zip");
        assert!(release.asset_named("tutils-linux.zip.sha256").is_some());
    }

    #[test]
    fn test_release_without_tag() {
        let release: Release = serde_json::from_str("{}").unwrap();
        assert!(release.tag_name.is_none());
        assert!(release.assets.is_empty());
    }

    #[test]
    fn test_urls() {
        let source = GitHubReleases::new("XXanderWP", "TerminalUtils").unwrap();
        assert_eq!(
            source.latest_url(),
            "https://api.github.com/repos/XXanderWP/TerminalUtils/releases/latest"
        );
        assert_eq!(source.releases_page(), "https://github.com/XXanderWP/TerminalUtils/releases");
    }
}

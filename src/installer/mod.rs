//! Self-installer: fetch the latest release and put it on PATH.
//!
//! 1. Ask the releases API for the latest release.
//! 2. Download its first `.zip` asset, verifying `<asset>.sha256` when the
//!    release ships one.
//! 3. Extract over the install directory.
//! 4. Add the directory to the user's shell profiles (see [`profile`]).

pub mod archive;
pub mod profile;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::ToolError;
use crate::update::release::{ReleaseSource, http_client};
use crate::utils::platform::{get_home_dir, is_windows};
use crate::utils::progress::download_bar;

const DOWNLOAD_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Where the archive is extracted
    pub dir: PathBuf,
    /// Add `dir` to shell profiles
    pub update_profiles: bool,
    /// Suppress progress output
    pub quiet: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub tag: String,
    pub asset: String,
    pub checksum_verified: bool,
    pub files: Vec<PathBuf>,
    pub profiles_updated: Vec<PathBuf>,
}

async fn download(client: &reqwest::Client, url: &str, label: &str, quiet: bool) -> Result<Vec<u8>> {
    let network = |reason: String| ToolError::NetworkError {
        operation: format!("download {label}"),
        reason,
    };

    let mut response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| network(e.to_string()))?;

    let pb = download_bar(label, response.content_length(), quiet);
    let mut bytes = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
    while let Some(chunk) = response.chunk().await.map_err(|e| network(e.to_string()))? {
        pb.inc(chunk.len() as u64);
        bytes.extend_from_slice(&chunk);
    }
    pb.finish_and_clear();

    debug!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes)
}

/// Download, verify and extract the latest release into `options.dir`.
pub async fn install<S: ReleaseSource>(source: &S, options: &InstallOptions) -> Result<InstallReport> {
    let release = source.latest_release().await?.ok_or_else(|| ToolError::NoReleaseAsset {
        tag: "latest".to_string(),
    })?;
    let tag = release.tag_name.clone().unwrap_or_else(|| "latest".to_string());

    let asset = release.asset_with_suffix(".zip").ok_or_else(|| ToolError::NoReleaseAsset {
        tag: tag.clone(),
    })?;
    info!("Installing {} from release {}", asset.name, tag);

    let client = http_client(DOWNLOAD_TIMEOUT)?;
    let bytes = download(&client, &asset.browser_download_url, &asset.name, options.quiet).await?;

    let checksum_name = format!("{}.sha256", asset.name);
    let checksum_verified = match release.asset_named(&checksum_name) {
        Some(checksum_asset) => {
            let content =
                download(&client, &checksum_asset.browser_download_url, &checksum_name, true).await?;
            let text = String::from_utf8_lossy(&content);
            let expected = archive::parse_checksum(&text, &asset.name).ok_or_else(|| {
                ToolError::ParseError {
                    file: checksum_name.clone(),
                    reason: "no SHA-256 digest found".to_string(),
                }
            })?;
            archive::verify(&bytes, &expected, &asset.name)?;
            true
        }
        None => {
            warn!("Release {} has no {}; skipping checksum verification", tag, checksum_name);
            false
        }
    };

    let files = archive::extract_zip(&bytes, &options.dir)
        .with_context(|| format!("Failed to install into {}", options.dir.display()))?;

    let profiles_updated = if options.update_profiles {
        update_profiles(&options.dir)?
    } else {
        Vec::new()
    };

    Ok(InstallReport {
        tag,
        asset: asset.name.clone(),
        checksum_verified,
        files,
        profiles_updated,
    })
}

/// Add `dir` to every candidate profile. No-op on Windows.
pub fn update_profiles(dir: &Path) -> Result<Vec<PathBuf>> {
    if is_windows() {
        debug!("Skipping shell profile update on Windows");
        return Ok(Vec::new());
    }

    let home = get_home_dir()?;
    let shell = std::env::var("SHELL").ok();
    let mut updated = Vec::new();
    for path in profile::candidate_profiles(&home, shell.as_deref(), Path::exists) {
        if profile::ensure_path_entry(&path, dir)? {
            updated.push(path);
        }
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update::Release;
    use tempfile::TempDir;

    struct StaticSource(Option<Release>);

    impl ReleaseSource for StaticSource {
        async fn latest_release(&self) -> Result<Option<Release>> {
            Ok(self.0.clone())
        }
    }

    fn options(temp: &TempDir) -> InstallOptions {
        InstallOptions {
            dir: temp.path().join("bin"),
            update_profiles: false,
            quiet: true,
        }
    }

    #[tokio::test]
    async fn test_install_without_release() {
        let temp = TempDir::new().unwrap();
        let err = install(&StaticSource(None), &options(&temp)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::NoReleaseAsset { .. })
        ));
    }

    #[tokio::test]
    async fn test_install_without_zip_asset() {
        let temp = TempDir::new().unwrap();
        let release = Release {
            tag_name: Some("v1.0.0".to_string()),
            assets: Vec::new(),
        };
        let err = install(&StaticSource(Some(release)), &options(&temp)).await.unwrap_err();
        match err.downcast_ref::<ToolError>() {
            Some(ToolError::NoReleaseAsset { tag }) => assert_eq!(tag, "v1.0.0"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!temp.path().join("bin").exists());
    }
}

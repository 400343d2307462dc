//! Release archive handling: checksum verification and zip extraction.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::ToolError;
use crate::utils::fs::ensure_dir;

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Expected digest from a `.sha256` file.
///
/// Accepts a bare digest or `sha256sum` output (`<digest>  <name>`); with
/// several lines, the one naming `asset_name` wins.
#[must_use]
pub fn parse_checksum(content: &str, asset_name: &str) -> Option<String> {
    let mut fallback = None;
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        let Some(digest) = fields.next() else { continue };
        let digest = digest.trim_start_matches("sha256:");
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            continue;
        }
        match fields.next().map(|n| n.trim_start_matches('*')) {
            Some(name) if name == asset_name => return Some(digest.to_ascii_lowercase()),
            _ => {
                fallback.get_or_insert_with(|| digest.to_ascii_lowercase());
            }
        }
    }
    fallback
}

pub fn verify(bytes: &[u8], expected: &str, file: &str) -> Result<(), ToolError> {
    let actual = sha256_hex(bytes);
    if actual.eq_ignore_ascii_case(expected) {
        debug!("Checksum verified for {}", file);
        Ok(())
    } else {
        Err(ToolError::ChecksumMismatch {
            file: file.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Extract a zip held in memory into `dest`, returning the files written.
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<Vec<PathBuf>> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Downloaded file is not a valid zip archive")?;
    ensure_dir(dest)?;

    let mut written = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).context("Failed to read zip entry")?;
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            ensure_dir(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }

        let mut out = std::fs::File::create(&target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {}", target.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&target, std::fs::Permissions::from_mode(mode & 0o777))
                .with_context(|| format!("Failed to set permissions on {}", target.display()))?;
        }

        written.push(target);
    }

    debug!("Extracted {} files into {}", written.len(), dest.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_parse_checksum() {
        let digest = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";
        assert_eq!(parse_checksum(digest, "a.zip").as_deref(), Some(digest));
        assert_eq!(
            parse_checksum(&format!("{}  a.zip\n", digest.to_uppercase()), "a.zip").as_deref(),
            Some(digest)
        );

        let other = "0".repeat(64);
        let multi = format!("{other}  b.zip\n{digest} *a.zip\n");
        assert_eq!(parse_checksum(&multi, "a.zip").as_deref(), Some(digest));
        assert_eq!(parse_checksum("not a digest", "a.zip"), None);
    }

    #[test]
    fn test_verify() {
        let good = sha256_hex(b"payload");
        assert!(verify(b"payload", &good, "a.zip").is_ok());
        assert!(matches!(
            verify(b"tampered", &good, "a.zip"),
            Err(ToolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let bytes = build_zip(&[("tutils", b"binary"), ("docs/README.md", b"# readme")]);

        let files = extract_zip(&bytes, temp.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(std::fs::read(temp.path().join("tutils")).unwrap(), b"binary");
        assert_eq!(std::fs::read_to_string(temp.path().join("docs/README.md")).unwrap(), "# readme");
    }

    #[test]
    fn test_extract_skips_escaping_entries() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("bin");
        let bytes = build_zip(&[("../evil", b"x"), ("ok", b"y")]);

        let files = extract_zip(&bytes, &dest).unwrap();
        assert_eq!(files, vec![dest.join("ok")]);
        assert!(!temp.path().join("evil").exists());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        assert!(extract_zip(b"not a zip", temp.path()).is_err());
    }
}

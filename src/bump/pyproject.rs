//! `pyproject.toml` version access.
//!
//! PEP 621 projects keep the version at `project.version`; Poetry projects at
//! `tool.poetry.version`. Rewrites go through `toml_edit` so comments, key
//! order and whitespace survive.

use anyhow::Result;
use toml_edit::{DocumentMut, Item, Value};

use crate::core::ToolError;

pub const FILE_NAME: &str = "pyproject.toml";

fn parse(content: &str) -> Result<DocumentMut, ToolError> {
    content.parse::<DocumentMut>().map_err(|e| ToolError::ParseError {
        file: FILE_NAME.to_string(),
        reason: e.to_string(),
    })
}

fn version_item<'a>(doc: &'a DocumentMut, path: &[&str]) -> Option<&'a Item> {
    let mut item = doc.as_item();
    for key in path {
        item = item.get(key)?;
    }
    Some(item)
}

/// Key path holding the version, `project.version` taking precedence.
fn locate(doc: &DocumentMut) -> Option<&'static [&'static str]> {
    const CANDIDATES: [&[&str]; 2] = [&["project", "version"], &["tool", "poetry", "version"]];
    CANDIDATES
        .into_iter()
        .find(|path| version_item(doc, path).and_then(Item::as_str).is_some())
}

/// The declared version, or `None` when neither table has one.
pub fn read_version(content: &str) -> Result<Option<String>> {
    let doc = parse(content)?;
    Ok(locate(&doc)
        .and_then(|path| version_item(&doc, path))
        .and_then(Item::as_str)
        .map(str::to_string))
}

/// Replace the version string, keeping the surrounding decoration.
pub fn set_version(content: &str, version: &str) -> Result<String> {
    let mut doc = parse(content)?;
    let path = locate(&doc).ok_or_else(|| ToolError::VersionFieldMissing {
        file: FILE_NAME.to_string(),
    })?;

    let mut item = doc.as_item_mut();
    for key in path {
        item = item.get_mut(key).ok_or_else(|| ToolError::VersionFieldMissing {
            file: FILE_NAME.to_string(),
        })?;
    }

    if let Some(value) = item.as_value_mut() {
        let decor = value.decor().clone();
        *value = Value::from(version);
        *value.decor_mut() = decor;
    }

    Ok(doc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_project_version() {
        let content = "[project]\nname = \"demo\"\nversion = \"0.1.0\"\n";
        assert_eq!(read_version(content).unwrap().as_deref(), Some("0.1.0"));
    }

    #[test]
    fn test_read_poetry_version() {
        let content = "[tool.poetry]\nname = \"demo\"\nversion = \"2.3.4\"\n";
        assert_eq!(read_version(content).unwrap().as_deref(), Some("2.3.4"));
    }

    #[test]
    fn test_project_wins_over_poetry() {
        let content = "[project]\nversion = \"1.0.0\"\n\n[tool.poetry]\nversion = \"9.9.9\"\n";
        assert_eq!(read_version(content).unwrap().as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_dynamic_version_falls_back_to_poetry() {
        let content = "[project]\ndynamic = [\"version\"]\n\n[tool.poetry]\nversion = \"0.5.0\"\n";
        assert_eq!(read_version(content).unwrap().as_deref(), Some("0.5.0"));
    }

    #[test]
    fn test_missing_version() {
        assert_eq!(read_version("[build-system]\nrequires = []\n").unwrap(), None);
        assert!(set_version("[project]\nname = \"x\"\n", "1.0.0").is_err());
    }

    #[test]
    fn test_set_version_preserves_formatting() {
        let content = "# Demo project\n[project]\nname    = \"demo\"\nversion = \"1.2.3\"   # bumped by tutils\n\n[tool.other]\nkey = 1\n";
        let updated = set_version(content, "1.3.0").unwrap();
        assert_eq!(
            updated,
            "# Demo project\n[project]\nname    = \"demo\"\nversion = \"1.3.0\"   # bumped by tutils\n\n[tool.other]\nkey = 1\n"
        );
    }

    #[test]
    fn test_invalid_toml() {
        assert!(read_version("[project\nversion = 1").is_err());
    }
}

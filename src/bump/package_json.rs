//! `package.json` version access. npm owns the write side.

use anyhow::Result;

use crate::core::ToolError;

pub const FILE_NAME: &str = "package.json";

pub fn read_version(content: &str) -> Result<Option<String>> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ToolError::ParseError {
            file: FILE_NAME.to_string(),
            reason: e.to_string(),
        })?;
    Ok(value.get("version").and_then(|v| v.as_str()).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_version() {
        assert_eq!(
            read_version(r#"{"name": "app", "version": "3.1.4"}"#).unwrap().as_deref(),
            Some("3.1.4")
        );
        assert_eq!(read_version(r#"{"name": "app"}"#).unwrap(), None);
        assert!(read_version("not json").is_err());
    }
}

//! Git operations used by the pull request helper and the version bumper.
//!
//! Like the other helpers this shells out to the system `git` rather than
//! embedding a git library, so the user's credential helpers, SSH agent and
//! configuration all apply unchanged. Every call runs in the process's
//! current directory unless a directory is passed explicitly.

use anyhow::Result;
use std::path::Path;

use crate::core::ToolError;
use crate::utils::ToolCommand;

fn git(dir: Option<&Path>) -> ToolCommand {
    let cmd = ToolCommand::new("git");
    match dir {
        Some(d) => cmd.current_dir(d),
        None => cmd,
    }
}

/// URL of the `origin` remote.
///
/// Outside a repository, or without an `origin`, this is [`ToolError::NoGitRemote`].
pub async fn origin_url(dir: Option<&Path>) -> Result<String> {
    let out = git(dir)
        .args(["config", "--get", "remote.origin.url"])
        .with_context("remote")
        .probe()
        .await?;

    let url = out.stdout.trim();
    if !out.success || url.is_empty() {
        return Err(ToolError::NoGitRemote.into());
    }
    Ok(url.to_string())
}

/// Branch names advertised by `origin`, in the order git lists them.
pub async fn remote_heads(dir: Option<&Path>) -> Result<Vec<String>> {
    let out = git(dir)
        .args(["ls-remote", "--heads", "origin"])
        .with_context("remote")
        .execute_stdout()
        .await?;
    Ok(parse_ls_remote_heads(&out))
}

/// Extract branch names from `git ls-remote --heads` output.
#[must_use]
pub fn parse_ls_remote_heads(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_once("refs/heads/"))
        .map(|(_, branch)| branch.trim().to_string())
        .filter(|branch| !branch.is_empty())
        .collect()
}

/// Whether `git status --porcelain` reports nothing.
pub async fn is_clean(dir: Option<&Path>) -> Result<bool> {
    let out = git(dir).args(["status", "--porcelain"]).execute_stdout().await?;
    Ok(out.is_empty())
}

pub async fn add(dir: Option<&Path>, path: &str) -> Result<()> {
    git(dir).args(["add", path]).execute().await?;
    Ok(())
}

pub async fn commit(dir: Option<&Path>, message: &str) -> Result<()> {
    git(dir).args(["commit", "-m", message]).execute().await?;
    Ok(())
}

pub async fn tag(dir: Option<&Path>, name: &str) -> Result<()> {
    git(dir).args(["tag", name]).execute().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_ls_remote_heads() {
        let out = "\
1111111111111111111111111111111111111111\trefs/heads/main
2222222222222222222222222222222222222222\trefs/heads/feature/login
3333333333333333333333333333333333333333\trefs/tags/v1.0.0
";
        assert_eq!(parse_ls_remote_heads(out), vec!["main", "feature/login"]);
    }

    #[test]
    fn test_parse_ls_remote_empty() {
        assert!(parse_ls_remote_heads("").is_empty());
    }

    #[tokio::test]
    async fn test_origin_url_outside_repo() {
        if !crate::utils::command_exists("git") {
            return;
        }
        let temp = TempDir::new().unwrap();
        let err = origin_url(Some(temp.path())).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<ToolError>(), Some(ToolError::NoGitRemote)));
    }

    #[tokio::test]
    async fn test_clean_and_commit_cycle() {
        if !crate::utils::command_exists("git") {
            return;
        }
        let temp = TempDir::new().unwrap();
        let dir = Some(temp.path());
        git(dir).args(["init", "-q"]).execute().await.unwrap();
        git(dir).args(["config", "user.email", "t@example.com"]).execute().await.unwrap();
        git(dir).args(["config", "user.name", "Test"]).execute().await.unwrap();
        git(dir).args(["config", "commit.gpgsign", "false"]).execute().await.unwrap();

        assert!(is_clean(dir).await.unwrap());
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();
        assert!(!is_clean(dir).await.unwrap());

        add(dir, "a.txt").await.unwrap();
        commit(dir, "v0.1.0").await.unwrap();
        tag(dir, "v0.1.0").await.unwrap();
        assert!(is_clean(dir).await.unwrap());

        let tags = git(dir).args(["tag", "--list"]).execute_stdout().await.unwrap();
        assert_eq!(tags, "v0.1.0");
    }
}
